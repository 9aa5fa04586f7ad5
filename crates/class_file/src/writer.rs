use std::{convert::TryFrom, io::Write};

use byteorder::{BigEndian, WriteBytesExt};
use log::Level;

use crate::{
    attributes::Attribute,
    constant_pool::{
        ClassInfo, DynamicInfo, MethodHandleInfo, MethodTypeInfo, NameAndTypeInfo, RefInfo,
    },
    ClassFile, ClassFileError, ConstantPool, CpInfo, MUtf8, Record, WriteOptions, CLASS_MAGIC,
};

type Result<T, E = ClassFileError> = std::result::Result<T, E>;
type Endian = BigEndian;

/// Encodes class files and their parts to a byte sink.
///
/// Lengths and counts are always recomputed from the structures being
/// written, never taken from what was decoded.
pub struct Writer<W> {
    w: W,
    options: WriteOptions,
}
impl<W: Write> Writer<W> {
    pub fn new(w: W) -> Self {
        Self::with_options(w, WriteOptions::default())
    }

    pub fn with_options(w: W, options: WriteOptions) -> Self {
        Self { w, options }
    }

    pub fn options(&self) -> WriteOptions {
        self.options
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    pub fn write(&mut self, class_file: &ClassFile) -> Result<()> {
        emit!(
            self.options,
            Level::Debug,
            "writing class file version {}.{} of {} bytes",
            class_file.major_version,
            class_file.minor_version,
            class_file.byte_length()
        );

        self.write_u32(CLASS_MAGIC)?;
        self.write_u16(class_file.minor_version)?;
        self.write_u16(class_file.major_version)?;
        self.write_constant_pool(&class_file.constant_pool)?;
        self.write_u16(class_file.access_flags.bits())?;
        self.write_u16(class_file.this_class)?;
        self.write_u16(class_file.super_class)?;
        self.write_table(&class_file.interfaces, "interfaces")?;
        self.write_table(&class_file.fields, "fields")?;
        self.write_table(&class_file.methods, "methods")?;
        class_file.attributes.write_to(self)?;
        self.w.flush()?;
        Ok(())
    }

    pub fn write_constant_pool(&mut self, constant_pool: &ConstantPool) -> Result<()> {
        self.write_count(constant_pool.count(), "constant pool entries")?;
        for cp_info in constant_pool {
            self.write_cp_info(cp_info)?;
        }
        emit!(
            self.options,
            Level::Trace,
            "constant pool of {} slots",
            constant_pool.len()
        );
        Ok(())
    }

    fn write_cp_info(&mut self, cp_info: &CpInfo) -> Result<()> {
        let Some(tag) = cp_info.tag() else {
            return Ok(());
        };
        self.write_u8(tag as u8)?;

        match cp_info {
            CpInfo::Utf8(s) => self.write_mutf8(s),
            CpInfo::Integer(v) => self.write_i32(*v),
            CpInfo::Float(v) => self.write_f32(*v),
            CpInfo::Long(v) => self.write_i64(*v),
            CpInfo::Double(v) => self.write_f64(*v),
            CpInfo::Class(ClassInfo { name_index })
            | CpInfo::Module { name_index }
            | CpInfo::Package { name_index } => self.write_u16(*name_index),
            CpInfo::String { string_index } => self.write_u16(*string_index),
            CpInfo::MethodType(MethodTypeInfo { descriptor_index }) => {
                self.write_u16(*descriptor_index)
            }
            CpInfo::FieldRef(RefInfo {
                class_index,
                name_and_type_index,
            })
            | CpInfo::MethodRef(RefInfo {
                class_index,
                name_and_type_index,
            })
            | CpInfo::InterfaceMethodRef(RefInfo {
                class_index,
                name_and_type_index,
            }) => {
                self.write_u16(*class_index)?;
                self.write_u16(*name_and_type_index)
            }
            CpInfo::NameAndType(NameAndTypeInfo {
                name_index,
                descriptor_index,
            }) => {
                self.write_u16(*name_index)?;
                self.write_u16(*descriptor_index)
            }
            CpInfo::MethodHandle(MethodHandleInfo {
                reference_kind,
                reference_index,
            }) => {
                self.write_u8(*reference_kind)?;
                self.write_u16(*reference_index)
            }
            CpInfo::Dynamic(DynamicInfo {
                bootstrap_method_attr_index,
                name_and_type_index,
            })
            | CpInfo::InvokeDynamic(DynamicInfo {
                bootstrap_method_attr_index,
                name_and_type_index,
            }) => {
                self.write_u16(*bootstrap_method_attr_index)?;
                self.write_u16(*name_and_type_index)
            }
            CpInfo::Unusable => Ok(()),
        }
    }

    pub fn write_attribute(&mut self, attribute: &Attribute) -> Result<()> {
        self.write_u16(attribute.attribute_name_index)?;
        self.write_u32(attribute.info.checked_byte_length()?)?;
        attribute.info.write_to(self)
    }

    /// Writes a `u2` count followed by the records.
    pub fn write_table<T: Record>(&mut self, items: &[T], what: &'static str) -> Result<()> {
        self.write_count(items.len(), what)?;
        self.write_sequence(items)
    }

    /// Writes a `u1` count followed by the records.
    pub fn write_short_table<T: Record>(&mut self, items: &[T], what: &'static str) -> Result<()> {
        let count = u8::try_from(items.len())
            .map_err(|_| ClassFileError::CountOverflow { what, len: items.len() })?;
        self.write_u8(count)?;
        self.write_sequence(items)
    }

    pub fn write_sequence<T: Record>(&mut self, items: &[T]) -> Result<()> {
        items.iter().try_for_each(|item| item.write_to(self))
    }

    pub fn write_count(&mut self, len: usize, what: &'static str) -> Result<()> {
        let count = u16::try_from(len).map_err(|_| ClassFileError::CountOverflow { what, len })?;
        self.write_u16(count)
    }

    pub fn write_mutf8(&mut self, s: &MUtf8) -> Result<()> {
        self.write_count(s.len(), "modified UTF-8 bytes")?;
        self.write_bytes(s.as_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.w.write_all(bytes)?;
        Ok(())
    }

    pub fn write_f64(&mut self, v: f64) -> Result<()> {
        self.write_i64(v.to_bits() as i64)
    }

    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        self.write_u32(v.to_bits())
    }

    pub fn write_i64(&mut self, v: i64) -> Result<()> {
        self.write_u32(((v as u64) >> 32) as u32)?;
        self.write_u32(v as u32)
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        self.w.write_i32::<Endian>(v)?;
        Ok(())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.w.write_u32::<Endian>(v)?;
        Ok(())
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.w.write_u16::<Endian>(v)?;
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.w.write_u8(v)?;
        Ok(())
    }
}

/// Checks that a byte count fits a `u4` length field.
pub(crate) fn u4_length(len: usize, what: &'static str) -> Result<u32> {
    u32::try_from(len).map_err(|_| ClassFileError::CountOverflow { what, len })
}
