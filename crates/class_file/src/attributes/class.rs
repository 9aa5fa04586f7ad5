use std::io::{Read, Write};

use crate::{
    record::table_length, AccessFlags, ConstantPool, Parser, Record, Result, Writer,
};

use super::Attributes;

#[derive(Debug, Clone, PartialEq)]
pub struct InnerClass {
    pub inner_class_info_index: u16,
    // zero for top-level, local and anonymous classes
    pub outer_class_info_index: u16,
    // zero for anonymous classes
    pub inner_name_index: u16,
    pub inner_class_access_flags: AccessFlags,
}
impl Record for InnerClass {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(Self {
            inner_class_info_index: parser.read_u16()?,
            outer_class_info_index: parser.read_u16()?,
            inner_name_index: parser.read_u16()?,
            inner_class_access_flags: AccessFlags::from_bits_truncate(parser.read_u16()?),
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.inner_class_info_index)?;
        writer.write_u16(self.outer_class_info_index)?;
        writer.write_u16(self.inner_name_index)?;
        writer.write_u16(self.inner_class_access_flags.bits())
    }

    fn byte_length(&self) -> u32 {
        8
    }
}

/// An entry of the `BootstrapMethods` attribute. Dynamic constants refer to
/// it by its position in the attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapMethod {
    pub bootstrap_method_ref: u16,
    pub bootstrap_arguments: Vec<u16>,
}
impl Record for BootstrapMethod {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(Self {
            bootstrap_method_ref: parser.read_u16()?,
            bootstrap_arguments: parser.read_index_table()?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.bootstrap_method_ref)?;
        writer.write_table(&self.bootstrap_arguments, "bootstrap arguments")
    }

    fn byte_length(&self) -> u32 {
        2 + table_length(&self.bootstrap_arguments)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodParameter {
    // zero for a parameter without a name
    pub name_index: u16,
    pub access_flags: AccessFlags,
}
impl Record for MethodParameter {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(Self {
            name_index: parser.read_u16()?,
            access_flags: AccessFlags::from_bits_truncate(parser.read_u16()?),
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.name_index)?;
        writer.write_u16(self.access_flags.bits())
    }

    fn byte_length(&self) -> u32 {
        4
    }
}

/// A component of a record class, with its own attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordComponent {
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}
impl Record for RecordComponent {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        Ok(Self {
            name_index: parser.read_u16()?,
            descriptor_index: parser.read_u16()?,
            attributes: parser.parse_attributes(constant_pool)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.name_index)?;
        writer.write_u16(self.descriptor_index)?;
        self.attributes.write_to(writer)
    }

    fn byte_length(&self) -> u32 {
        4 + self.attributes.byte_length()
    }
}
