use std::io::{Read, Write};

use crate::{ConstantPool, Parser, Record, Result, Writer};

#[derive(Debug, Clone, PartialEq)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line_number: u16,
}
impl Record for LineNumber {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(Self {
            start_pc: parser.read_u16()?,
            line_number: parser.read_u16()?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.start_pc)?;
        writer.write_u16(self.line_number)
    }

    fn byte_length(&self) -> u32 {
        4
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}
impl Record for LocalVariable {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(Self {
            start_pc: parser.read_u16()?,
            length: parser.read_u16()?,
            name_index: parser.read_u16()?,
            descriptor_index: parser.read_u16()?,
            index: parser.read_u16()?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.start_pc)?;
        writer.write_u16(self.length)?;
        writer.write_u16(self.name_index)?;
        writer.write_u16(self.descriptor_index)?;
        writer.write_u16(self.index)
    }

    fn byte_length(&self) -> u32 {
        10
    }
}

/// Like [`LocalVariable`], but pointing at a generic signature instead of a
/// descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariableType {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub signature_index: u16,
    pub index: u16,
}
impl Record for LocalVariableType {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(Self {
            start_pc: parser.read_u16()?,
            length: parser.read_u16()?,
            name_index: parser.read_u16()?,
            signature_index: parser.read_u16()?,
            index: parser.read_u16()?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.start_pc)?;
        writer.write_u16(self.length)?;
        writer.write_u16(self.name_index)?;
        writer.write_u16(self.signature_index)?;
        writer.write_u16(self.index)
    }

    fn byte_length(&self) -> u32 {
        10
    }
}
