use std::{convert::TryFrom, io::Read};

use byteorder::{BigEndian, ReadBytesExt};
use log::Level;

use crate::{
    attributes::{Attribute, AttributeInfo, Attributes},
    class_file::{FieldInfo, MethodInfo},
    constant_pool::{
        ClassInfo, CpInfo, CpTag, DynamicInfo, MethodHandleInfo, MethodTypeInfo,
        NameAndTypeInfo, RefInfo,
    },
    AccessFlags, ClassFile, ClassFileError, ConstantPool, ErrorKind, MUtf8, ReadOptions, Record,
    CLASS_MAGIC,
};

type Result<T, E = ClassFileError> = std::result::Result<T, E>;
type Endian = BigEndian;

/// How deep element values and attributes inside attributes may nest.
pub const MAX_NESTING: u16 = 64;

/// Decodes class files and their parts from a byte stream.
pub struct Parser<R> {
    r: R,
    position: u64,
    depth: u16,
    options: ReadOptions,
}
impl<R: Read> Parser<R> {
    pub fn new(r: R) -> Self {
        Self::with_options(r, ReadOptions::default())
    }

    pub fn with_options(r: R, options: ReadOptions) -> Self {
        Self {
            r,
            position: 0,
            depth: 0,
            options,
        }
    }

    pub fn options(&self) -> ReadOptions {
        self.options
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Decodes one nested level with `f`, failing once the structure nests
    /// deeper than [`MAX_NESTING`].
    pub(crate) fn nested<T>(
        &mut self,
        what: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(ClassFileError::NestingTooDeep {
                what,
                limit: MAX_NESTING,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    pub fn parse(&mut self) -> Result<ClassFile> {
        self.parse_magic_identifier()?;
        let (major_version, minor_version) = self.parse_version()?;
        emit!(
            self.options,
            Level::Debug,
            "class file version {}.{}",
            major_version,
            minor_version
        );

        let constant_pool = self.parse_constant_pool()?;
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let this_class = self.read_u16()?;
        let super_class = self.read_u16()?;
        let interfaces = self.read_index_table()?;
        let fields = self.read_table::<FieldInfo>(&constant_pool)?;
        let methods = self.read_table::<MethodInfo>(&constant_pool)?;
        emit!(
            self.options,
            Level::Debug,
            "{} interfaces, {} fields, {} methods",
            interfaces.len(),
            fields.len(),
            methods.len()
        );

        let attributes = self.parse_class_attributes(&constant_pool)?;

        Ok(ClassFile {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn parse_magic_identifier(&mut self) -> Result<()> {
        match self.read_u32()? {
            CLASS_MAGIC => Ok(()),
            magic_identifier => Err(ClassFileError::InvalidMagicIdentifier(magic_identifier)),
        }
    }

    fn parse_version(&mut self) -> Result<(u16, u16)> {
        let minor = self.read_u16()?;
        let major = self.read_u16()?;
        Ok((major, minor))
    }

    pub fn parse_constant_pool(&mut self) -> Result<ConstantPool> {
        let constant_pool_count = self.read_u16()?;
        if constant_pool_count == 0 {
            return Err(ClassFileError::InvalidConstantPoolCount(constant_pool_count));
        }

        let mut count = constant_pool_count as usize - 1;
        let mut res = Vec::with_capacity(count);
        while count > 0 {
            let index = res.len() as u16 + 1;
            let (cp_info, slot_size) = self.parse_cp_info()?;
            if slot_size > count {
                return Err(ClassFileError::DanglingWideConstant(index));
            }
            res.push(cp_info);
            (0..slot_size - 1).for_each(|_| res.push(CpInfo::Unusable));

            count -= slot_size;
        }
        emit!(
            self.options,
            Level::Debug,
            "constant pool of {} slots",
            res.len()
        );
        Ok(ConstantPool::new(res))
    }

    fn parse_cp_info(&mut self) -> Result<(CpInfo, usize)> {
        let tag = self.read_u8()?;
        let tag = CpTag::try_from(tag).map_err(ClassFileError::InvalidCpInfoTag)?;
        let cp_info = match tag {
            CpTag::Utf8 => CpInfo::Utf8(self.read_mutf8()?),
            CpTag::Integer => CpInfo::Integer(self.read_i32()?),
            CpTag::Float => CpInfo::Float(self.read_f32()?),
            CpTag::Long => CpInfo::Long(self.read_i64()?),
            CpTag::Double => CpInfo::Double(self.read_f64()?),
            CpTag::Class => CpInfo::Class(ClassInfo {
                name_index: self.read_u16()?,
            }),
            CpTag::String => CpInfo::String {
                string_index: self.read_u16()?,
            },
            CpTag::FieldRef => CpInfo::FieldRef(self.parse_ref_info()?),
            CpTag::MethodRef => CpInfo::MethodRef(self.parse_ref_info()?),
            CpTag::InterfaceMethodRef => CpInfo::InterfaceMethodRef(self.parse_ref_info()?),
            CpTag::NameAndType => self.parse_name_and_type_info()?,
            CpTag::MethodHandle => self.parse_method_handle()?,
            CpTag::MethodType => CpInfo::MethodType(MethodTypeInfo {
                descriptor_index: self.read_u16()?,
            }),
            CpTag::Dynamic => CpInfo::Dynamic(self.parse_dynamic_info()?),
            CpTag::InvokeDynamic => CpInfo::InvokeDynamic(self.parse_dynamic_info()?),
            CpTag::Module => CpInfo::Module {
                name_index: self.read_u16()?,
            },
            CpTag::Package => CpInfo::Package {
                name_index: self.read_u16()?,
            },
        };

        let slot_size = if cp_info.is_wide() { 2 } else { 1 };
        Ok((cp_info, slot_size))
    }

    fn parse_name_and_type_info(&mut self) -> Result<CpInfo> {
        let name_index = self.read_u16()?;
        let descriptor_index = self.read_u16()?;

        Ok(CpInfo::NameAndType(NameAndTypeInfo {
            name_index,
            descriptor_index,
        }))
    }

    fn parse_method_handle(&mut self) -> Result<CpInfo> {
        let reference_kind = self.read_u8()?;
        let reference_index = self.read_u16()?;

        Ok(CpInfo::MethodHandle(MethodHandleInfo {
            reference_kind,
            reference_index,
        }))
    }

    fn parse_dynamic_info(&mut self) -> Result<DynamicInfo> {
        let bootstrap_method_attr_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(DynamicInfo {
            bootstrap_method_attr_index,
            name_and_type_index,
        })
    }

    fn parse_ref_info(&mut self) -> Result<RefInfo> {
        let class_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(RefInfo {
            class_index,
            name_and_type_index,
        })
    }

    pub fn parse_attributes(&mut self, constant_pool: &ConstantPool) -> Result<Attributes> {
        let attributes_count = self.read_u16()?;
        (0..attributes_count)
            .map(|_| self.parse_attribute(constant_pool))
            .collect::<Result<Vec<_>>>()
            .map(Attributes)
    }

    // The only section where a premature end may be tolerated.
    fn parse_class_attributes(&mut self, constant_pool: &ConstantPool) -> Result<Attributes> {
        if !self.options.tolerate_truncation {
            return self.parse_attributes(constant_pool);
        }

        let mut attributes = Attributes::default();
        let attributes_count = match self.read_u16() {
            Ok(attributes_count) => attributes_count,
            Err(e) if e.is_truncated() => {
                emit!(
                    self.options,
                    Level::Warn,
                    "class file ends before its attributes"
                );
                return Ok(attributes);
            }
            Err(e) => return Err(e),
        };

        for i in 0..attributes_count {
            match self.parse_attribute(constant_pool) {
                Ok(attribute) => attributes.push(attribute),
                Err(e) if e.is_truncated() => {
                    emit!(
                        self.options,
                        Level::Warn,
                        "class file ends in attribute {} of {}, keeping the first {}",
                        i + 1,
                        attributes_count,
                        i
                    );
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(attributes)
    }

    pub fn parse_attribute(&mut self, constant_pool: &ConstantPool) -> Result<Attribute> {
        let attribute_name_index = self.read_u16()?;
        let attribute_length = self.read_u32()?;
        let info = self.read_bytes(attribute_length as usize)?;
        let name = constant_pool.utf8(attribute_name_index)?;
        let info = self.parse_attribute_info(name, info, constant_pool)?;

        Ok(Attribute {
            attribute_name_index,
            info,
        })
    }

    fn parse_attribute_info(
        &self,
        name: &MUtf8,
        info: Vec<u8>,
        constant_pool: &ConstantPool,
    ) -> Result<AttributeInfo> {
        let Some(name) = name.to_str() else {
            return Ok(AttributeInfo::Unknown(info));
        };
        let length = info.len() as u32;
        let mut nested = Parser::with_options(info.as_slice(), self.options);
        nested.depth = self.depth;

        let read = nested.nested("attributes", |nested| {
            AttributeInfo::read_from(&name, nested, constant_pool).transpose()
        });
        let parsed = match read {
            Ok(None) => {
                emit!(
                    self.options,
                    Level::Debug,
                    "keeping unknown {} attribute of {} bytes",
                    name,
                    length
                );
                return Ok(AttributeInfo::Unknown(info));
            }
            Ok(Some(attribute_info)) if nested.position() == length as u64 => Ok(attribute_info),
            Ok(Some(_)) => Err(ClassFileError::AttributeUnderrun {
                name: name.to_string(),
                length,
                remaining: length as u64 - nested.position(),
            }),
            Err(e) if e.is_truncated() => Err(ClassFileError::AttributeOverrun {
                name: name.to_string(),
                length,
            }),
            Err(e) => Err(e),
        };

        match parsed {
            Err(e) if !self.options.strict_attributes && e.kind() == ErrorKind::Malformed => {
                emit!(
                    self.options,
                    Level::Warn,
                    "keeping malformed {} attribute as raw bytes: {}",
                    name,
                    e
                );
                Ok(AttributeInfo::Unknown(info))
            }
            parsed => {
                if let Ok(attribute_info) = &parsed {
                    emit!(
                        self.options,
                        Level::Trace,
                        "{} attribute of {} bytes",
                        name,
                        attribute_info.byte_length()
                    );
                }
                parsed
            }
        }
    }

    /// Reads a `u2` count followed by that many records.
    pub fn read_table<T: Record>(&mut self, constant_pool: &ConstantPool) -> Result<Vec<T>> {
        let count = self.read_u16()?;
        self.read_sequence(constant_pool, count as usize)
    }

    /// Reads a `u1` count followed by that many records.
    pub fn read_short_table<T: Record>(&mut self, constant_pool: &ConstantPool) -> Result<Vec<T>> {
        let count = self.read_u8()?;
        self.read_sequence(constant_pool, count as usize)
    }

    pub fn read_sequence<T: Record>(
        &mut self,
        constant_pool: &ConstantPool,
        length: usize,
    ) -> Result<Vec<T>> {
        (0..length)
            .map(|_| T::read_from(self, constant_pool))
            .collect()
    }

    /// Reads a `u2` count followed by that many `u2` indices.
    pub fn read_index_table(&mut self) -> Result<Vec<u16>> {
        let count = self.read_u16()? as usize;
        let mut indices = vec![0u16; count];
        self.r.read_u16_into::<Endian>(&mut indices)?;
        self.position += 2 * count as u64;
        Ok(indices)
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let read = (&mut self.r).take(length as u64).read_to_end(&mut bytes)?;
        self.position += read as u64;
        if read < length {
            return Err(ClassFileError::UnexpectedEof);
        }
        Ok(bytes)
    }

    /// Reads everything left in the stream.
    pub fn read_remaining(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let read = self.r.read_to_end(&mut bytes)?;
        self.position += read as u64;
        Ok(bytes)
    }

    pub fn read_mutf8(&mut self) -> Result<MUtf8> {
        let length = self.read_u16()?;
        Ok(MUtf8::from_bytes(self.read_bytes(length as usize)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_i64()? as u64))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let high_bytes = self.read_u32()?;
        let low_bytes = self.read_u32()?;

        Ok(((high_bytes as u64) << 32 | low_bytes as u64) as i64)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let v = self.r.read_i32::<Endian>()?;
        self.position += 4;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let v = self.r.read_u32::<Endian>()?;
        self.position += 4;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let v = self.r.read_u16::<Endian>()?;
        self.position += 2;
        Ok(v)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let v = self.r.read_u8()?;
        self.position += 1;
        Ok(v)
    }
}




#[cfg(test)]
mod parse_attribute_tests {
    use super::*;

    fn pool(names: &[&str]) -> ConstantPool {
        ConstantPool::new(names.iter().map(|n| CpInfo::Utf8((*n).into())).collect())
    }

    #[test]
    fn it_should_keep_unknown_attributes_as_raw_bytes() {
        let cp = pool(&["XyzCustom"]);
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0xaa, 0xbb, 0xcc];
        let attribute = Parser::new(&bytes[..]).parse_attribute(&cp).unwrap();

        assert_eq!(1, attribute.attribute_name_index);
        assert_eq!(AttributeInfo::Unknown(vec![0xaa, 0xbb, 0xcc]), attribute.info);
    }

    #[test]
    fn it_should_reject_a_name_that_is_not_utf8() {
        let cp = ConstantPool::new(vec![CpInfo::Integer(1)]);
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            Parser::new(&bytes[..]).parse_attribute(&cp),
            Err(ClassFileError::UnexpectedConstantPoolEntry("Utf8", _))
        ));
    }

    #[test]
    fn it_should_fail_when_a_payload_is_too_long() {
        let cp = pool(&["SourceFile"]);
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x00, 0x01, 0x00];
        assert!(matches!(
            Parser::new(&bytes[..]).parse_attribute(&cp),
            Err(ClassFileError::AttributeUnderrun { remaining: 1, .. })
        ));
    }

    #[test]
    fn it_should_fail_when_a_payload_is_too_short() {
        let cp = pool(&["SourceFile"]);
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00];
        let e = Parser::new(&bytes[..]).parse_attribute(&cp).unwrap_err();
        assert!(matches!(e, ClassFileError::AttributeOverrun { length: 1, .. }));
        assert_eq!(ErrorKind::Malformed, e.kind());
    }

    #[test]
    fn it_should_keep_malformed_payloads_when_lenient() {
        let cp = pool(&["StackMapTable"]);
        // one frame with the reserved type 200
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x00, 0x01, 200];
        let options = ReadOptions::new().strict_attributes(false);
        let attribute = Parser::with_options(&bytes[..], options)
            .parse_attribute(&cp)
            .unwrap();
        assert_eq!(AttributeInfo::Unknown(vec![0x00, 0x01, 200]), attribute.info);

        assert!(matches!(
            Parser::new(&bytes[..]).parse_attribute(&cp),
            Err(ClassFileError::InvalidStackMapFrameType(200))
        ));
    }

    #[test]
    fn it_should_report_truncation_of_the_outer_stream() {
        let cp = pool(&["XyzCustom"]);
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x07, 0xaa];
        let e = Parser::new(&bytes[..]).parse_attribute(&cp).unwrap_err();
        assert_eq!(ErrorKind::Truncated, e.kind());
    }
}
