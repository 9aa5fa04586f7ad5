use std::{
    convert::TryFrom,
    io::{Read, Write},
};

use crate::{
    record::{items_length, table_length},
    ClassFileError, ConstantPool, Parser, Record, Result, Writer,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub type_index: u16,
    pub element_value_pairs: Vec<ElementValuePair>,
}
impl Record for Annotation {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        Ok(Self {
            type_index: parser.read_u16()?,
            element_value_pairs: parser.read_table(constant_pool)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.type_index)?;
        writer.write_table(&self.element_value_pairs, "element value pairs")
    }

    fn byte_length(&self) -> u32 {
        2 + table_length(&self.element_value_pairs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementValuePair {
    pub element_name_index: u16,
    pub value: ElementValue,
}
impl Record for ElementValuePair {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        Ok(Self {
            element_name_index: parser.read_u16()?,
            value: ElementValue::read_from(parser, constant_pool)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.element_name_index)?;
        self.value.write_to(writer)
    }

    fn byte_length(&self) -> u32 {
        2 + self.value.byte_length()
    }
}

/// The value of an annotation element. Arrays and nested annotations
/// recurse.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    /// A primitive or string constant; `tag` is one of `BCDFIJSZs`.
    Const { tag: u8, const_value_index: u16 },
    Enum {
        type_name_index: u16,
        const_name_index: u16,
    },
    Class { class_info_index: u16 },
    Annotation(Annotation),
    Array { values: Vec<ElementValue> },
}
impl ElementValue {
    pub fn tag(&self) -> u8 {
        match self {
            ElementValue::Const { tag, .. } => *tag,
            ElementValue::Enum { .. } => b'e',
            ElementValue::Class { .. } => b'c',
            ElementValue::Annotation(_) => b'@',
            ElementValue::Array { .. } => b'[',
        }
    }
}
impl Record for ElementValue {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        let tag = parser.read_u8()?;
        Ok(match tag {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => ElementValue::Const {
                tag,
                const_value_index: parser.read_u16()?,
            },
            b'e' => ElementValue::Enum {
                type_name_index: parser.read_u16()?,
                const_name_index: parser.read_u16()?,
            },
            b'c' => ElementValue::Class {
                class_info_index: parser.read_u16()?,
            },
            b'@' => ElementValue::Annotation(parser.nested("element values", |parser| {
                Annotation::read_from(parser, constant_pool)
            })?),
            b'[' => ElementValue::Array {
                values: parser
                    .nested("element values", |parser| parser.read_table(constant_pool))?,
            },
            _ => return Err(ClassFileError::InvalidElementValueTag(tag)),
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u8(self.tag())?;
        match self {
            ElementValue::Const {
                const_value_index, ..
            } => writer.write_u16(*const_value_index),
            ElementValue::Enum {
                type_name_index,
                const_name_index,
            } => {
                writer.write_u16(*type_name_index)?;
                writer.write_u16(*const_name_index)
            }
            ElementValue::Class { class_info_index } => writer.write_u16(*class_info_index),
            ElementValue::Annotation(annotation) => annotation.write_to(writer),
            ElementValue::Array { values } => writer.write_table(values, "array values"),
        }
    }

    fn byte_length(&self) -> u32 {
        1 + match self {
            ElementValue::Const { .. } | ElementValue::Class { .. } => 2,
            ElementValue::Enum { .. } => 4,
            ElementValue::Annotation(annotation) => annotation.byte_length(),
            ElementValue::Array { values } => table_length(values),
        }
    }
}

/// The annotations of one formal parameter.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParameterAnnotations {
    pub annotations: Vec<Annotation>,
}
impl Record for ParameterAnnotations {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        Ok(Self {
            annotations: parser.read_table(constant_pool)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_table(&self.annotations, "parameter annotations")
    }

    fn byte_length(&self) -> u32 {
        table_length(&self.annotations)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    /// The raw `target_type` byte. It selects the shape of `target_info`.
    pub target_type: u8,
    pub target_info: TargetInfo,
    pub target_path: TypePath,
    pub type_index: u16,
    pub element_value_pairs: Vec<ElementValuePair>,
}
impl Record for TypeAnnotation {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        let target_type = parser.read_u8()?;
        let target_info = TargetInfo::read_from(target_type, parser, constant_pool)?;
        let target_path = TypePath::read_from(parser, constant_pool)?;
        let type_index = parser.read_u16()?;
        let element_value_pairs = parser.read_table(constant_pool)?;

        Ok(Self {
            target_type,
            target_info,
            target_path,
            type_index,
            element_value_pairs,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u8(self.target_type)?;
        self.target_info.write_to(writer)?;
        self.target_path.write_to(writer)?;
        writer.write_u16(self.type_index)?;
        writer.write_table(&self.element_value_pairs, "element value pairs")
    }

    fn byte_length(&self) -> u32 {
        1 + self.target_info.byte_length()
            + self.target_path.byte_length()
            + 2
            + table_length(&self.element_value_pairs)
    }
}

/// Which type in a declaration or expression a type annotation applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetInfo {
    TypeParameter {
        type_parameter_index: u8,
    },
    Supertype {
        // 65535 means the superclass, anything else an index into `interfaces`
        supertype_index: u16,
    },
    TypeParameterBound {
        type_parameter_index: u8,
        bound_index: u8,
    },
    Empty,
    FormalParameter {
        formal_parameter_index: u8,
    },
    Throws {
        throws_type_index: u16,
    },
    LocalVar {
        table: Vec<LocalVarTarget>,
    },
    Catch {
        exception_table_index: u16,
    },
    Offset {
        offset: u16,
    },
    TypeArgument {
        offset: u16,
        type_argument_index: u8,
    },
}
impl TargetInfo {
    fn read_from<R: Read>(
        target_type: u8,
        parser: &mut Parser<R>,
        constant_pool: &ConstantPool,
    ) -> Result<Self> {
        Ok(match target_type {
            0x00 | 0x01 => TargetInfo::TypeParameter {
                type_parameter_index: parser.read_u8()?,
            },
            0x10 => TargetInfo::Supertype {
                supertype_index: parser.read_u16()?,
            },
            0x11 | 0x12 => TargetInfo::TypeParameterBound {
                type_parameter_index: parser.read_u8()?,
                bound_index: parser.read_u8()?,
            },
            0x13..=0x15 => TargetInfo::Empty,
            0x16 => TargetInfo::FormalParameter {
                formal_parameter_index: parser.read_u8()?,
            },
            0x17 => TargetInfo::Throws {
                throws_type_index: parser.read_u16()?,
            },
            0x40 | 0x41 => TargetInfo::LocalVar {
                table: parser.read_table(constant_pool)?,
            },
            0x42 => TargetInfo::Catch {
                exception_table_index: parser.read_u16()?,
            },
            0x43..=0x46 => TargetInfo::Offset {
                offset: parser.read_u16()?,
            },
            0x47..=0x4b => TargetInfo::TypeArgument {
                offset: parser.read_u16()?,
                type_argument_index: parser.read_u8()?,
            },
            _ => return Err(ClassFileError::InvalidTargetType(target_type)),
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        match self {
            TargetInfo::TypeParameter {
                type_parameter_index: index,
            }
            | TargetInfo::FormalParameter {
                formal_parameter_index: index,
            } => writer.write_u8(*index),
            TargetInfo::Supertype {
                supertype_index: index,
            }
            | TargetInfo::Throws {
                throws_type_index: index,
            }
            | TargetInfo::Catch {
                exception_table_index: index,
            }
            | TargetInfo::Offset { offset: index } => writer.write_u16(*index),
            TargetInfo::TypeParameterBound {
                type_parameter_index,
                bound_index,
            } => {
                writer.write_u8(*type_parameter_index)?;
                writer.write_u8(*bound_index)
            }
            TargetInfo::Empty => Ok(()),
            TargetInfo::LocalVar { table } => writer.write_table(table, "local variable targets"),
            TargetInfo::TypeArgument {
                offset,
                type_argument_index,
            } => {
                writer.write_u16(*offset)?;
                writer.write_u8(*type_argument_index)
            }
        }
    }

    fn byte_length(&self) -> u32 {
        match self {
            TargetInfo::Empty => 0,
            TargetInfo::TypeParameter { .. } | TargetInfo::FormalParameter { .. } => 1,
            TargetInfo::Supertype { .. }
            | TargetInfo::TypeParameterBound { .. }
            | TargetInfo::Throws { .. }
            | TargetInfo::Catch { .. }
            | TargetInfo::Offset { .. } => 2,
            TargetInfo::TypeArgument { .. } => 3,
            TargetInfo::LocalVar { table } => table_length(table),
        }
    }
}

/// A live range of a local variable carrying a type annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVarTarget {
    pub start_pc: u16,
    pub length: u16,
    pub index: u16,
}
impl Record for LocalVarTarget {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(Self {
            start_pc: parser.read_u16()?,
            length: parser.read_u16()?,
            index: parser.read_u16()?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.start_pc)?;
        writer.write_u16(self.length)?;
        writer.write_u16(self.index)
    }

    fn byte_length(&self) -> u32 {
        6
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TypePath {
    pub path: Vec<TypePathEntry>,
}
impl Record for TypePath {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        Ok(Self {
            path: parser.read_short_table(constant_pool)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_short_table(&self.path, "type path entries")
    }

    fn byte_length(&self) -> u32 {
        1 + items_length(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypePathEntry {
    pub type_path_kind: TypePathKind,
    // zero unless the kind is TypeArgument
    pub type_argument_index: u8,
}
impl Record for TypePathEntry {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        let type_path_kind =
            TypePathKind::try_from(parser.read_u8()?).map_err(ClassFileError::InvalidTypePathKind)?;
        Ok(Self {
            type_path_kind,
            type_argument_index: parser.read_u8()?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u8(self.type_path_kind as u8)?;
        writer.write_u8(self.type_argument_index)
    }

    fn byte_length(&self) -> u32 {
        2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TypePathKind {
    ArrayElement = 0,
    Nested = 1,
    WildcardBound = 2,
    TypeArgument = 3,
}
impl TryFrom<u8> for TypePathKind {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(TypePathKind::ArrayElement),
            1 => Ok(TypePathKind::Nested),
            2 => Ok(TypePathKind::WildcardBound),
            3 => Ok(TypePathKind::TypeArgument),
            _ => Err(value),
        }
    }
}

#[cfg(test)]
mod annotation_tests {
    use super::*;
    use crate::parser::MAX_NESTING;

    fn decode<T: Record>(bytes: &[u8]) -> Result<T> {
        T::read_from(&mut Parser::new(bytes), &ConstantPool::default())
    }

    fn encode<T: Record>(record: &T) -> Vec<u8> {
        let mut writer = Writer::new(Vec::new());
        record.write_to(&mut writer).unwrap();
        writer.into_inner()
    }

    #[test]
    fn it_should_decode_nested_element_values() {
        let bytes = [
            0x00, 0x05, // type_index
            0x00, 0x02, // num_element_value_pairs
            0x00, 0x06, b'[', 0x00, 0x02, b'I', 0x00, 0x07, b'e', 0x00, 0x08, 0x00, 0x09,
            0x00, 0x0a, b'@', 0x00, 0x0b, 0x00, 0x01, 0x00, 0x0c, b'c', 0x00, 0x0d,
        ];
        let annotation: Annotation = decode(&bytes).unwrap();

        assert_eq!(
            ElementValue::Array {
                values: vec![
                    ElementValue::Const {
                        tag: b'I',
                        const_value_index: 7
                    },
                    ElementValue::Enum {
                        type_name_index: 8,
                        const_name_index: 9
                    },
                ]
            },
            annotation.element_value_pairs[0].value
        );
        let ElementValue::Annotation(nested) = &annotation.element_value_pairs[1].value else {
            panic!("expected a nested annotation");
        };
        assert_eq!(11, nested.type_index);
        assert_eq!(bytes.len() as u32, annotation.byte_length());
        assert_eq!(&bytes[..], &encode(&annotation)[..]);
    }

    fn nested_arrays(depth: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        for _ in 0..depth {
            bytes.extend_from_slice(&[b'[', 0x00, 0x01]);
        }
        bytes.extend_from_slice(&[b'I', 0x00, 0x07]);
        bytes
    }

    #[test]
    fn it_should_refuse_element_values_nested_too_deep() {
        let deepest = nested_arrays(MAX_NESTING as usize);
        let value: ElementValue = decode(&deepest).unwrap();
        assert_eq!(deepest.len() as u32, value.byte_length());

        assert!(matches!(
            decode::<ElementValue>(&nested_arrays(MAX_NESTING as usize + 1)),
            Err(ClassFileError::NestingTooDeep {
                what: "element values",
                ..
            })
        ));
        assert!(matches!(
            decode::<ElementValue>(&nested_arrays(10_000)),
            Err(ClassFileError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn it_should_count_nested_annotations_towards_the_depth() {
        let mut bytes = Vec::new();
        for _ in 0..=MAX_NESTING {
            // an annotation with a single pair whose value nests again
            bytes.extend_from_slice(&[b'@', 0x00, 0x05, 0x00, 0x01, 0x00, 0x06]);
        }
        bytes.extend_from_slice(&[b'Z', 0x00, 0x07]);

        assert!(matches!(
            decode::<ElementValue>(&bytes),
            Err(ClassFileError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn it_should_reject_unknown_element_value_tags() {
        assert!(matches!(
            decode::<ElementValue>(&[b'x', 0x00, 0x01]),
            Err(ClassFileError::InvalidElementValueTag(b'x'))
        ));
    }

    #[test]
    fn it_should_decode_type_annotations_on_local_variables() {
        let bytes = [
            0x40, // target_type
            0x00, 0x01, 0x00, 0x02, 0x00, 0x0a, 0x00, 0x01, // localvar_target
            0x02, 0x03, 0x00, 0x00, 0x00, // type_path
            0x00, 0x04, // type_index
            0x00, 0x00, // num_element_value_pairs
        ];
        let annotation: TypeAnnotation = decode(&bytes).unwrap();

        assert_eq!(0x40, annotation.target_type);
        assert_eq!(
            TargetInfo::LocalVar {
                table: vec![LocalVarTarget {
                    start_pc: 2,
                    length: 10,
                    index: 1
                }]
            },
            annotation.target_info
        );
        assert_eq!(
            vec![TypePathKind::TypeArgument, TypePathKind::ArrayElement],
            annotation
                .target_path
                .path
                .iter()
                .map(|e| e.type_path_kind)
                .collect::<Vec<_>>()
        );
        assert_eq!(bytes.len() as u32, annotation.byte_length());
        assert_eq!(&bytes[..], &encode(&annotation)[..]);
    }

    #[test]
    fn it_should_reject_unknown_target_types() {
        assert!(matches!(
            decode::<TypeAnnotation>(&[0x20, 0x00]),
            Err(ClassFileError::InvalidTargetType(0x20))
        ));
    }

    #[test]
    fn it_should_reject_unknown_type_path_kinds() {
        assert_eq!(Err(4), TypePathKind::try_from(4));
        assert!(matches!(
            decode::<TypePath>(&[0x01, 0x04, 0x00]),
            Err(ClassFileError::InvalidTypePathKind(4))
        ));
    }
}
