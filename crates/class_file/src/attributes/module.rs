use std::io::{Read, Write};

use crate::{record::table_length, ConstantPool, Parser, Record, Result, Writer};

/// The `Module` attribute of a `module-info` class.
///
/// Flag words are kept as raw bits so unassigned bits survive a round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleAttribute {
    pub module_name_index: u16,
    pub module_flags: u16,
    // zero when no version is recorded
    pub module_version_index: u16,
    pub requires: Vec<ModuleRequires>,
    pub exports: Vec<ModuleExports>,
    pub opens: Vec<ModuleOpens>,
    pub uses_index: Vec<u16>,
    pub provides: Vec<ModuleProvides>,
}
impl Record for ModuleAttribute {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        Ok(Self {
            module_name_index: parser.read_u16()?,
            module_flags: parser.read_u16()?,
            module_version_index: parser.read_u16()?,
            requires: parser.read_table(constant_pool)?,
            exports: parser.read_table(constant_pool)?,
            opens: parser.read_table(constant_pool)?,
            uses_index: parser.read_index_table()?,
            provides: parser.read_table(constant_pool)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.module_name_index)?;
        writer.write_u16(self.module_flags)?;
        writer.write_u16(self.module_version_index)?;
        writer.write_table(&self.requires, "requires")?;
        writer.write_table(&self.exports, "exports")?;
        writer.write_table(&self.opens, "opens")?;
        writer.write_table(&self.uses_index, "uses")?;
        writer.write_table(&self.provides, "provides")
    }

    fn byte_length(&self) -> u32 {
        6 + table_length(&self.requires)
            + table_length(&self.exports)
            + table_length(&self.opens)
            + table_length(&self.uses_index)
            + table_length(&self.provides)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRequires {
    pub requires_index: u16,
    pub requires_flags: u16,
    pub requires_version_index: u16,
}
impl Record for ModuleRequires {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(Self {
            requires_index: parser.read_u16()?,
            requires_flags: parser.read_u16()?,
            requires_version_index: parser.read_u16()?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.requires_index)?;
        writer.write_u16(self.requires_flags)?;
        writer.write_u16(self.requires_version_index)
    }

    fn byte_length(&self) -> u32 {
        6
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleExports {
    pub exports_index: u16,
    pub exports_flags: u16,
    // empty for an unqualified export
    pub exports_to_index: Vec<u16>,
}
impl Record for ModuleExports {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(Self {
            exports_index: parser.read_u16()?,
            exports_flags: parser.read_u16()?,
            exports_to_index: parser.read_index_table()?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.exports_index)?;
        writer.write_u16(self.exports_flags)?;
        writer.write_table(&self.exports_to_index, "exports targets")
    }

    fn byte_length(&self) -> u32 {
        4 + table_length(&self.exports_to_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleOpens {
    pub opens_index: u16,
    pub opens_flags: u16,
    pub opens_to_index: Vec<u16>,
}
impl Record for ModuleOpens {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(Self {
            opens_index: parser.read_u16()?,
            opens_flags: parser.read_u16()?,
            opens_to_index: parser.read_index_table()?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.opens_index)?;
        writer.write_u16(self.opens_flags)?;
        writer.write_table(&self.opens_to_index, "opens targets")
    }

    fn byte_length(&self) -> u32 {
        4 + table_length(&self.opens_to_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleProvides {
    pub provides_index: u16,
    pub provides_with_index: Vec<u16>,
}
impl Record for ModuleProvides {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(Self {
            provides_index: parser.read_u16()?,
            provides_with_index: parser.read_index_table()?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.provides_index)?;
        writer.write_table(&self.provides_with_index, "provides implementations")
    }

    fn byte_length(&self) -> u32 {
        2 + table_length(&self.provides_with_index)
    }
}
