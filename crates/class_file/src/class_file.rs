use std::{
    borrow::Cow,
    fs,
    io::{Read, Write},
    path::Path,
};

use crate::{
    attributes::{AttributeInfo, Attributes, BootstrapMethod},
    record::table_length,
    AccessFlags, ConstantPool, Parser, ReadOptions, Record, Result, WriteOptions, Writer,
};

pub const CLASS_MAGIC: u32 = 0xCAFEBABE;

/// A decoded class file.
///
/// Every field is public and may be edited in place. Nothing is validated
/// until it is looked up, and writing recomputes every length and count.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: AccessFlags,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Attributes,
}
impl ClassFile {
    pub fn parse(bytes: impl Read) -> Result<ClassFile> {
        Parser::new(bytes).parse()
    }

    pub fn read_from(r: impl Read) -> Result<ClassFile> {
        Self::parse(r)
    }

    pub fn read_with_options(r: impl Read, options: ReadOptions) -> Result<ClassFile> {
        Parser::with_options(r, options).parse()
    }

    pub fn read_from_bytes(bytes: &[u8]) -> Result<ClassFile> {
        Self::parse(bytes)
    }

    pub fn read_from_path(path: impl AsRef<Path>) -> Result<ClassFile> {
        let bytes = fs::read(path)?;
        Self::read_from_bytes(&bytes)
    }

    pub fn write_to(&self, w: impl Write) -> Result<()> {
        Writer::new(w).write(self)
    }

    pub fn write_with_options(&self, w: impl Write, options: WriteOptions) -> Result<()> {
        Writer::with_options(w, options).write(self)
    }

    pub fn write_to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.byte_length() as usize);
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.write_to_bytes()?)?;
        Ok(())
    }

    /// Size of the encoded class file.
    pub fn byte_length(&self) -> u32 {
        4 + 2
            + 2
            + self.constant_pool.byte_length()
            + 2
            + 2
            + 2
            + table_length(&self.interfaces)
            + table_length(&self.fields)
            + table_length(&self.methods)
            + self.attributes.byte_length()
    }

    pub fn class_name(&self) -> Result<Cow<'_, str>> {
        self.constant_pool.class_name(self.this_class)
    }

    /// The direct superclass, or `None` for `java/lang/Object` whose
    /// `super_class` is zero.
    pub fn super_class(&self) -> Result<Option<Cow<'_, str>>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.class_name(self.super_class).map(Some)
    }

    pub fn interface_names(&self) -> Result<Vec<Cow<'_, str>>> {
        self.interfaces
            .iter()
            .map(|&index| self.constant_pool.class_name(index))
            .collect()
    }

    pub fn field_name(&self, field: &FieldInfo) -> Result<Cow<'_, str>> {
        self.constant_pool.utf8_str(field.name_index)
    }

    pub fn field_descriptor(&self, field: &FieldInfo) -> Result<Cow<'_, str>> {
        self.constant_pool.utf8_str(field.descriptor_index)
    }

    pub fn method_name(&self, method: &MethodInfo) -> Result<Cow<'_, str>> {
        self.constant_pool.utf8_str(method.name_index)
    }

    pub fn method_descriptor(&self, method: &MethodInfo) -> Result<Cow<'_, str>> {
        self.constant_pool.utf8_str(method.descriptor_index)
    }

    pub fn find_field(&self, name: &str, descriptor: &str) -> Option<&FieldInfo> {
        let index = self.member_position(&self.fields, name, descriptor)?;
        self.fields.get(index)
    }

    pub fn find_field_mut(&mut self, name: &str, descriptor: &str) -> Option<&mut FieldInfo> {
        let index = self.member_position(&self.fields, name, descriptor)?;
        self.fields.get_mut(index)
    }

    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        let index = self.member_position(&self.methods, name, descriptor)?;
        self.methods.get(index)
    }

    pub fn find_method_mut(&mut self, name: &str, descriptor: &str) -> Option<&mut MethodInfo> {
        let index = self.member_position(&self.methods, name, descriptor)?;
        self.methods.get_mut(index)
    }

    fn member_position(&self, members: &[MemberInfo], name: &str, descriptor: &str) -> Option<usize> {
        let matches = |index: u16, expected: &str| {
            self.constant_pool
                .utf8(index)
                .map_or(false, |s| s == expected)
        };
        members
            .iter()
            .position(|m| matches(m.name_index, name) && matches(m.descriptor_index, descriptor))
    }

    /// The entries of the class's `BootstrapMethods` attribute.
    pub fn bootstrap_methods(&self) -> Option<&[BootstrapMethod]> {
        self.attributes.iter().find_map(|a| match &a.info {
            AttributeInfo::BootstrapMethods { bootstrap_methods } => {
                Some(bootstrap_methods.as_slice())
            }
            _ => None,
        })
    }
}

/// A field or method. Both share the same layout.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}
impl Record for MemberInfo {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        Ok(Self {
            access_flags: AccessFlags::from_bits_truncate(parser.read_u16()?),
            name_index: parser.read_u16()?,
            descriptor_index: parser.read_u16()?,
            attributes: parser.parse_attributes(constant_pool)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.access_flags.bits())?;
        writer.write_u16(self.name_index)?;
        writer.write_u16(self.descriptor_index)?;
        self.attributes.write_to(writer)
    }

    fn byte_length(&self) -> u32 {
        6 + self.attributes.byte_length()
    }
}

pub type FieldInfo = MemberInfo;
pub type MethodInfo = MemberInfo;
