use std::io::{Read, Write};

use crate::{
    record::{items_length, table_length},
    ClassFileError, ConstantPool, Parser, Record, Result, Writer,
};

const SAME_LOCALS_1_STACK_ITEM: u8 = 64;
const SAME_LOCALS_1_STACK_ITEM_EXTENDED: u8 = 247;
const SAME_FRAME_EXTENDED: u8 = 251;
const FULL_FRAME: u8 = 255;

/// Frames in bytecode order. Each frame stores only its offset delta; the
/// absolute offsets come from [`StackMapTable::bytecode_offsets`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StackMapTable {
    pub entries: Vec<StackMapFrame>,
}
impl StackMapTable {
    /// The bytecode offset each frame applies to.
    ///
    /// The first frame sits at its own delta; every later frame sits at the
    /// previous offset plus its delta plus one.
    pub fn bytecode_offsets(&self) -> Vec<u32> {
        let mut previous: Option<u32> = None;
        self.entries
            .iter()
            .map(|frame| {
                let delta = frame.offset_delta() as u32;
                let offset = match previous {
                    None => delta,
                    Some(previous) => previous + delta + 1,
                };
                previous = Some(offset);
                offset
            })
            .collect()
    }
}
impl Record for StackMapTable {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        Ok(Self {
            entries: parser.read_table(constant_pool)?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_table(&self.entries, "stack map frames")
    }

    fn byte_length(&self) -> u32 {
        table_length(&self.entries)
    }
}

/// A stack map frame. The frame type byte is derived from the variant and
/// its content.
///
/// `Same` and `SameLocals1StackItem` frames whose delta no longer fits in
/// the frame type byte are written in their extended form.
#[derive(Debug, Clone, PartialEq)]
pub enum StackMapFrame {
    Same {
        offset_delta: u16,
    },
    SameLocals1StackItem {
        offset_delta: u16,
        stack: VerificationType,
    },
    SameLocals1StackItemExtended {
        offset_delta: u16,
        stack: VerificationType,
    },
    Chop {
        // 1 to 3
        absent_locals: u8,
        offset_delta: u16,
    },
    SameExtended {
        offset_delta: u16,
    },
    Append {
        offset_delta: u16,
        // 1 to 3 entries
        locals: Vec<VerificationType>,
    },
    Full {
        offset_delta: u16,
        locals: Vec<VerificationType>,
        stack: Vec<VerificationType>,
    },
}
impl StackMapFrame {
    pub fn offset_delta(&self) -> u16 {
        match self {
            Self::Same { offset_delta }
            | Self::SameLocals1StackItem { offset_delta, .. }
            | Self::SameLocals1StackItemExtended { offset_delta, .. }
            | Self::Chop { offset_delta, .. }
            | Self::SameExtended { offset_delta }
            | Self::Append { offset_delta, .. }
            | Self::Full { offset_delta, .. } => *offset_delta,
        }
    }

    /// The frame type byte this frame is written with.
    ///
    /// Fails for `Chop` and `Append` frames whose local count falls outside
    /// 1 to 3, since no frame type can express it.
    pub fn frame_type(&self) -> Result<u8> {
        Ok(match self {
            Self::Same { offset_delta } if *offset_delta < SAME_LOCALS_1_STACK_ITEM as u16 => {
                *offset_delta as u8
            }
            Self::Same { .. } | Self::SameExtended { .. } => SAME_FRAME_EXTENDED,
            Self::SameLocals1StackItem { offset_delta, .. }
                if *offset_delta < SAME_LOCALS_1_STACK_ITEM as u16 =>
            {
                SAME_LOCALS_1_STACK_ITEM + *offset_delta as u8
            }
            Self::SameLocals1StackItem { .. } | Self::SameLocals1StackItemExtended { .. } => {
                SAME_LOCALS_1_STACK_ITEM_EXTENDED
            }
            Self::Chop { absent_locals, .. } => {
                SAME_FRAME_EXTENDED - local_count("chop", *absent_locals as usize)?
            }
            Self::Append { locals, .. } => {
                SAME_FRAME_EXTENDED + local_count("append", locals.len())?
            }
            Self::Full { .. } => FULL_FRAME,
        })
    }

    // Frames with a type below 64 or 128 carry their delta in the type byte.
    fn has_compact_delta(&self) -> bool {
        match self {
            Self::Same { offset_delta } | Self::SameLocals1StackItem { offset_delta, .. } => {
                *offset_delta < SAME_LOCALS_1_STACK_ITEM as u16
            }
            _ => false,
        }
    }
}

fn local_count(frame: &'static str, count: usize) -> Result<u8> {
    match count {
        1..=3 => Ok(count as u8),
        _ => Err(ClassFileError::InvalidFrameLocalCount { frame, count }),
    }
}

impl Record for StackMapFrame {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        let frame_type = parser.read_u8()?;
        Ok(match frame_type {
            0..=63 => Self::Same {
                offset_delta: frame_type as u16,
            },
            64..=127 => Self::SameLocals1StackItem {
                offset_delta: (frame_type - SAME_LOCALS_1_STACK_ITEM) as u16,
                stack: VerificationType::read_from(parser, constant_pool)?,
            },
            SAME_LOCALS_1_STACK_ITEM_EXTENDED => Self::SameLocals1StackItemExtended {
                offset_delta: parser.read_u16()?,
                stack: VerificationType::read_from(parser, constant_pool)?,
            },
            248..=250 => Self::Chop {
                absent_locals: SAME_FRAME_EXTENDED - frame_type,
                offset_delta: parser.read_u16()?,
            },
            SAME_FRAME_EXTENDED => Self::SameExtended {
                offset_delta: parser.read_u16()?,
            },
            252..=254 => Self::Append {
                offset_delta: parser.read_u16()?,
                locals: parser.read_sequence(
                    constant_pool,
                    (frame_type - SAME_FRAME_EXTENDED) as usize,
                )?,
            },
            FULL_FRAME => Self::Full {
                offset_delta: parser.read_u16()?,
                locals: parser.read_table(constant_pool)?,
                stack: parser.read_table(constant_pool)?,
            },
            _ => return Err(ClassFileError::InvalidStackMapFrameType(frame_type)),
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u8(self.frame_type()?)?;
        if !self.has_compact_delta() {
            writer.write_u16(self.offset_delta())?;
        }

        match self {
            Self::Same { .. } | Self::SameExtended { .. } | Self::Chop { .. } => Ok(()),
            Self::SameLocals1StackItem { stack, .. }
            | Self::SameLocals1StackItemExtended { stack, .. } => stack.write_to(writer),
            Self::Append { locals, .. } => writer.write_sequence(locals),
            Self::Full { locals, stack, .. } => {
                writer.write_table(locals, "frame locals")?;
                writer.write_table(stack, "frame stack items")
            }
        }
    }

    fn byte_length(&self) -> u32 {
        let header = if self.has_compact_delta() { 1 } else { 3 };
        header
            + match self {
                Self::Same { .. } | Self::SameExtended { .. } | Self::Chop { .. } => 0,
                Self::SameLocals1StackItem { stack, .. }
                | Self::SameLocals1StackItemExtended { stack, .. } => stack.byte_length(),
                Self::Append { locals, .. } => items_length(locals),
                Self::Full { locals, stack, .. } => table_length(locals) + table_length(stack),
            }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,
    UninitializedThis,
    Object { cpool_index: u16 },
    /// `offset` is the position of the `new` instruction that created the
    /// object.
    Uninitialized { offset: u16 },
}
impl VerificationType {
    pub fn tag(&self) -> u8 {
        match self {
            Self::Top => 0,
            Self::Integer => 1,
            Self::Float => 2,
            Self::Double => 3,
            Self::Long => 4,
            Self::Null => 5,
            Self::UninitializedThis => 6,
            Self::Object { .. } => 7,
            Self::Uninitialized { .. } => 8,
        }
    }
}
impl Record for VerificationType {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(match parser.read_u8()? {
            0 => Self::Top,
            1 => Self::Integer,
            2 => Self::Float,
            3 => Self::Double,
            4 => Self::Long,
            5 => Self::Null,
            6 => Self::UninitializedThis,
            7 => Self::Object {
                cpool_index: parser.read_u16()?,
            },
            8 => Self::Uninitialized {
                offset: parser.read_u16()?,
            },
            tag => return Err(ClassFileError::InvalidVerificationTypeTag(tag)),
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u8(self.tag())?;
        match self {
            Self::Object { cpool_index: index } | Self::Uninitialized { offset: index } => {
                writer.write_u16(*index)
            }
            _ => Ok(()),
        }
    }

    fn byte_length(&self) -> u32 {
        match self {
            Self::Object { .. } | Self::Uninitialized { .. } => 3,
            _ => 1,
        }
    }
}
