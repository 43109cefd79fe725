use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Enumerates supported `InstructionKind` values.
pub enum InstructionKind {
    Read,
    Write,
    Chart,
    Question,
    Other,
    Inappropriate,
}

impl InstructionKind {
    /// Parses a planner kind tag. Unknown tags return `None`; the
    /// executor rejects them, not the planner.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "READ" => Some(Self::Read),
            "WRITE" => Some(Self::Write),
            "CHART" => Some(Self::Chart),
            "QUESTION" => Some(Self::Question),
            "OTHER" => Some(Self::Other),
            "INAPPROPRIATE" => Some(Self::Inappropriate),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Chart => "CHART",
            Self::Question => "QUESTION",
            Self::Other => "OTHER",
            Self::Inappropriate => "INAPPROPRIATE",
        }
    }

    /// The registry tool used to obtain arguments for this kind.
    /// `Inappropriate` never reaches a completion call.
    pub fn tool_name(&self) -> Option<&'static str> {
        match self {
            Self::Write => Some("write_table"),
            Self::Read => Some("read_table"),
            Self::Chart => Some("create_chart"),
            Self::Question => Some("answer_question"),
            Self::Other => Some("other_instruction"),
            Self::Inappropriate => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One planned unit of work. The kind tag is kept verbatim as the
/// model produced it so unrecognized tags survive until dispatch.
pub struct Instruction {
    pub kind_tag: String,
    pub text: String,
}

impl Instruction {
    pub fn new(kind_tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind_tag: kind_tag.into(),
            text: text.into(),
        }
    }

    pub fn kind(&self) -> Option<InstructionKind> {
        InstructionKind::from_tag(&self.kind_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::{Instruction, InstructionKind};

    #[test]
    fn unit_kind_tags_round_trip() {
        for kind in [
            InstructionKind::Read,
            InstructionKind::Write,
            InstructionKind::Chart,
            InstructionKind::Question,
            InstructionKind::Other,
            InstructionKind::Inappropriate,
        ] {
            assert_eq!(InstructionKind::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn unit_unrecognized_tag_is_preserved_but_unresolvable() {
        let instruction = Instruction::new("DELETE", "drop the table");
        assert_eq!(instruction.kind(), None);
        assert_eq!(instruction.kind_tag, "DELETE");
    }

    #[test]
    fn unit_inappropriate_has_no_tool() {
        assert_eq!(InstructionKind::Inappropriate.tool_name(), None);
        assert_eq!(InstructionKind::Write.tool_name(), Some("write_table"));
    }
}
