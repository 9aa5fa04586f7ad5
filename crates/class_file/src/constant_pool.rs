use std::{borrow::Cow, convert::TryFrom, ops::Index};

use crate::{ClassFileError, MUtf8, Result};

#[macro_export]
macro_rules! matches_cp_info {
    ($cp:expr, $index:expr, $i:ident) => {
        match $cp.get($index) {
            Ok($crate::CpInfo::$i(ref n)) => Ok(n),
            Ok(c) => Err($crate::ClassFileError::UnexpectedConstantPoolEntry(
                stringify!($i),
                c.clone(),
            )),
            Err(e) => Err(e),
        }
    };
}

/// The constant pool of a class file.
///
/// Indices are 1-based as on the wire. A long or double occupies two
/// indices; the second one holds [`CpInfo::Unusable`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConstantPool {
    cp_infos: Vec<CpInfo>,
}
impl ConstantPool {
    pub fn new(cp_infos: Vec<CpInfo>) -> Self {
        Self { cp_infos }
    }

    /// Number of occupied slots, placeholders included.
    pub fn len(&self) -> usize {
        self.cp_infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cp_infos.is_empty()
    }

    /// The `constant_pool_count` written to the class file.
    pub fn count(&self) -> usize {
        self.cp_infos.len() + 1
    }

    pub fn get(&self, index: u16) -> Result<&CpInfo> {
        match self.slot(index)? {
            CpInfo::Unusable => Err(ClassFileError::UnusableConstantPoolSlot(index)),
            cp_info => Ok(cp_info),
        }
    }

    pub fn get_mut(&mut self, index: u16) -> Result<&mut CpInfo> {
        if index == 0 || index as usize > self.cp_infos.len() {
            return Err(ClassFileError::InvalidConstantPoolIndex(index));
        }
        match &mut self.cp_infos[index as usize - 1] {
            CpInfo::Unusable => Err(ClassFileError::UnusableConstantPoolSlot(index)),
            cp_info => Ok(cp_info),
        }
    }

    /// Looks up `index` and checks that it holds a `tag` entry.
    pub fn resolve(&self, index: u16, tag: CpTag) -> Result<&CpInfo> {
        let cp_info = self.get(index)?;
        if cp_info.tag() != Some(tag) {
            return Err(ClassFileError::UnexpectedConstantPoolEntry(
                tag.name(),
                cp_info.clone(),
            ));
        }
        Ok(cp_info)
    }

    pub fn utf8(&self, index: u16) -> Result<&MUtf8> {
        matches_cp_info!(self, index, Utf8)
    }

    pub fn utf8_mut(&mut self, index: u16) -> Result<&mut MUtf8> {
        match self.get_mut(index)? {
            CpInfo::Utf8(s) => Ok(s),
            c => Err(ClassFileError::UnexpectedConstantPoolEntry(
                "Utf8",
                c.clone(),
            )),
        }
    }

    /// The decoded text of the Utf8 entry at `index`.
    pub fn utf8_str(&self, index: u16) -> Result<Cow<'_, str>> {
        self.utf8(index)?
            .to_str()
            .ok_or(ClassFileError::InvalidModifiedUtf8(index))
    }

    /// The name of the Class entry at `index`.
    pub fn class_name(&self, index: u16) -> Result<Cow<'_, str>> {
        let ClassInfo { name_index } = matches_cp_info!(self, index, Class)?;
        self.utf8_str(*name_index)
    }

    /// The name and descriptor of the NameAndType entry at `index`.
    pub fn name_and_type(&self, index: u16) -> Result<(Cow<'_, str>, Cow<'_, str>)> {
        let NameAndTypeInfo {
            name_index,
            descriptor_index,
        } = matches_cp_info!(self, index, NameAndType)?;
        Ok((self.utf8_str(*name_index)?, self.utf8_str(*descriptor_index)?))
    }

    /// Appends an entry, returning its index.
    pub fn push(&mut self, cp_info: CpInfo) -> Result<u16> {
        let slots = if cp_info.is_wide() { 2 } else { 1 };
        let index = self.cp_infos.len() + 1;
        if index + slots > u16::MAX as usize {
            return Err(ClassFileError::CountOverflow {
                what: "constant pool entries",
                len: index + slots,
            });
        }

        self.cp_infos.push(cp_info);
        if slots == 2 {
            self.cp_infos.push(CpInfo::Unusable);
        }
        Ok(index as u16)
    }

    /// Finds the first Utf8 entry holding `text`.
    pub fn find_utf8(&self, text: &str) -> Option<u16> {
        self.iter().find_map(|(index, cp_info)| match cp_info {
            CpInfo::Utf8(s) if s == text => Some(index),
            _ => None,
        })
    }

    /// Iterates over real entries with their indices, skipping placeholders.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &CpInfo)> {
        self.cp_infos
            .iter()
            .enumerate()
            .filter(|(_, cp_info)| !matches!(cp_info, CpInfo::Unusable))
            .map(|(i, cp_info)| (i as u16 + 1, cp_info))
    }

    /// Encoded size of the pool including its count.
    pub fn byte_length(&self) -> u32 {
        2 + self.cp_infos.iter().map(CpInfo::byte_length).sum::<u32>()
    }

    fn slot(&self, index: u16) -> Result<&CpInfo> {
        if index == 0 {
            return Err(ClassFileError::InvalidConstantPoolIndex(index));
        }
        self.cp_infos
            .get(index as usize - 1)
            .ok_or(ClassFileError::InvalidConstantPoolIndex(index))
    }
}
impl Index<u16> for ConstantPool {
    type Output = CpInfo;

    /// # Panics
    ///
    /// Panics if `index` is zero or past the end of the pool.
    fn index(&self, index: u16) -> &Self::Output {
        &self.cp_infos[index as usize - 1]
    }
}
impl<'a> IntoIterator for &'a ConstantPool {
    type Item = &'a CpInfo;
    type IntoIter = std::slice::Iter<'a, CpInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.cp_infos.iter()
    }
}

/// The one-byte tag that opens every constant pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CpTag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    FieldRef = 9,
    MethodRef = 10,
    InterfaceMethodRef = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
}
impl CpTag {
    pub fn name(self) -> &'static str {
        match self {
            CpTag::Utf8 => "Utf8",
            CpTag::Integer => "Integer",
            CpTag::Float => "Float",
            CpTag::Long => "Long",
            CpTag::Double => "Double",
            CpTag::Class => "Class",
            CpTag::String => "String",
            CpTag::FieldRef => "FieldRef",
            CpTag::MethodRef => "MethodRef",
            CpTag::InterfaceMethodRef => "InterfaceMethodRef",
            CpTag::NameAndType => "NameAndType",
            CpTag::MethodHandle => "MethodHandle",
            CpTag::MethodType => "MethodType",
            CpTag::Dynamic => "Dynamic",
            CpTag::InvokeDynamic => "InvokeDynamic",
            CpTag::Module => "Module",
            CpTag::Package => "Package",
        }
    }
}
impl TryFrom<u8> for CpTag {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(CpTag::Utf8),
            3 => Ok(CpTag::Integer),
            4 => Ok(CpTag::Float),
            5 => Ok(CpTag::Long),
            6 => Ok(CpTag::Double),
            7 => Ok(CpTag::Class),
            8 => Ok(CpTag::String),
            9 => Ok(CpTag::FieldRef),
            10 => Ok(CpTag::MethodRef),
            11 => Ok(CpTag::InterfaceMethodRef),
            12 => Ok(CpTag::NameAndType),
            15 => Ok(CpTag::MethodHandle),
            16 => Ok(CpTag::MethodType),
            17 => Ok(CpTag::Dynamic),
            18 => Ok(CpTag::InvokeDynamic),
            19 => Ok(CpTag::Module),
            20 => Ok(CpTag::Package),
            _ => Err(value),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum CpInfo {
    MethodRef(RefInfo),
    FieldRef(RefInfo),
    Float(f32),
    InterfaceMethodRef(RefInfo),
    Class(ClassInfo),
    NameAndType(NameAndTypeInfo),
    Utf8(MUtf8),
    String { string_index: u16 },
    Dynamic(DynamicInfo),
    InvokeDynamic(DynamicInfo),
    Integer(i32),
    MethodHandle(MethodHandleInfo),
    MethodType(MethodTypeInfo),
    Long(i64),
    Double(f64),
    Module { name_index: u16 },
    Package { name_index: u16 },
    Unusable,
}
impl CpInfo {
    pub fn tag(&self) -> Option<CpTag> {
        Some(match self {
            CpInfo::MethodRef(_) => CpTag::MethodRef,
            CpInfo::FieldRef(_) => CpTag::FieldRef,
            CpInfo::Float(_) => CpTag::Float,
            CpInfo::InterfaceMethodRef(_) => CpTag::InterfaceMethodRef,
            CpInfo::Class(_) => CpTag::Class,
            CpInfo::NameAndType(_) => CpTag::NameAndType,
            CpInfo::Utf8(_) => CpTag::Utf8,
            CpInfo::String { .. } => CpTag::String,
            CpInfo::Dynamic(_) => CpTag::Dynamic,
            CpInfo::InvokeDynamic(_) => CpTag::InvokeDynamic,
            CpInfo::Integer(_) => CpTag::Integer,
            CpInfo::MethodHandle(_) => CpTag::MethodHandle,
            CpInfo::MethodType(_) => CpTag::MethodType,
            CpInfo::Long(_) => CpTag::Long,
            CpInfo::Double(_) => CpTag::Double,
            CpInfo::Module { .. } => CpTag::Module,
            CpInfo::Package { .. } => CpTag::Package,
            CpInfo::Unusable => return None,
        })
    }

    /// Whether the entry takes two constant pool slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, CpInfo::Long(_) | CpInfo::Double(_))
    }

    /// Encoded size including the tag byte. Placeholders encode to nothing.
    pub fn byte_length(&self) -> u32 {
        match self {
            CpInfo::Utf8(s) => 3 + s.len() as u32,
            CpInfo::Class(_)
            | CpInfo::String { .. }
            | CpInfo::MethodType(_)
            | CpInfo::Module { .. }
            | CpInfo::Package { .. } => 3,
            CpInfo::MethodHandle(_) => 4,
            CpInfo::Integer(_)
            | CpInfo::Float(_)
            | CpInfo::FieldRef(_)
            | CpInfo::MethodRef(_)
            | CpInfo::InterfaceMethodRef(_)
            | CpInfo::NameAndType(_)
            | CpInfo::Dynamic(_)
            | CpInfo::InvokeDynamic(_) => 5,
            CpInfo::Long(_) | CpInfo::Double(_) => 9,
            CpInfo::Unusable => 0,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassInfo {
    // The constant_pool entry at name_index must be a CONSTANT_Utf8_info structure
    // representing a valid binary class or interface name encoded in internal form.
    pub name_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}

/// Payload of `CONSTANT_Dynamic_info` and `CONSTANT_InvokeDynamic_info`.
///
/// `bootstrap_method_attr_index` is a position in the class's
/// `BootstrapMethods` attribute, not a constant pool index.
#[derive(Debug, PartialEq, Clone)]
pub struct DynamicInfo {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodHandleInfo {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodTypeInfo {
    pub descriptor_index: u16,
}
