//! TAC operands: temporaries, named variables, and literal constants.

use std::fmt;

use naturec_syntax::DataType;

/// An instruction operand. Every operand resolves to a [`DataType`]; for
/// constants the type is fixed by the variant, temporaries and variables
/// carry the type the IR builder knew at emission time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Operand {
    /// Unused slot.
    #[default]
    None,
    /// Compiler temporary `t<id>`.
    Temp { id: u32, ty: DataType },
    /// Named variable from source.
    Var { name: String, ty: DataType },
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// Jump target `L<id>`.
    Label(u32),
    /// Callee name.
    Func(String),
}

impl Operand {
    pub fn temp(id: u32, ty: DataType) -> Self {
        Operand::Temp { id, ty }
    }

    pub fn var(name: impl Into<String>, ty: DataType) -> Self {
        Operand::Var {
            name: name.into(),
            ty,
        }
    }

    pub fn func(name: impl Into<String>) -> Self {
        Operand::Func(name.into())
    }

    /// The operand's data type.
    pub fn ty(&self) -> DataType {
        match self {
            Operand::None | Operand::Label(_) => DataType::Unknown,
            Operand::Temp { ty, .. } | Operand::Var { ty, .. } => *ty,
            Operand::Int(_) => DataType::Number,
            Operand::Float(_) => DataType::Decimal,
            Operand::Str(_) => DataType::Text,
            Operand::Bool(_) => DataType::Flag,
            Operand::Func(_) => DataType::Function,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Operand::None)
    }

    pub fn is_temp(&self) -> bool {
        matches!(self, Operand::Temp { .. })
    }

    /// Temp id, if this is a temporary.
    pub fn temp_id(&self) -> Option<u32> {
        match self {
            Operand::Temp { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Label id, if this is a label reference.
    pub fn label_id(&self) -> Option<u32> {
        match self {
            Operand::Label(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Operand::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Operand::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric constant value widened to `f64`, if any.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Operand::Int(v) => Some(*v as f64),
            Operand::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_numeric_const(&self) -> bool {
        matches!(self, Operand::Int(_) | Operand::Float(_))
    }

    /// True for any literal constant operand.
    pub fn is_const(&self) -> bool {
        matches!(
            self,
            Operand::Int(_) | Operand::Float(_) | Operand::Str(_) | Operand::Bool(_)
        )
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => f.write_str("_"),
            Operand::Temp { id, .. } => write!(f, "t{}", id),
            Operand::Var { name, .. } => f.write_str(name),
            Operand::Int(v) => write!(f, "{}", v),
            Operand::Float(v) => write!(f, "{}", v),
            Operand::Str(s) => write!(f, "{:?}", s),
            Operand::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Operand::Label(id) => write!(f, "L{}", id),
            Operand::Func(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_types_are_fixed() {
        assert_eq!(Operand::Int(3).ty(), DataType::Number);
        assert_eq!(Operand::Float(1.5).ty(), DataType::Decimal);
        assert_eq!(Operand::Str("hi".into()).ty(), DataType::Text);
        assert_eq!(Operand::Bool(true).ty(), DataType::Flag);
    }

    #[test]
    fn numeric_widening() {
        assert_eq!(Operand::Int(4).as_numeric(), Some(4.0));
        assert_eq!(Operand::Float(2.5).as_numeric(), Some(2.5));
        assert_eq!(Operand::Bool(true).as_numeric(), None);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Operand::temp(3, DataType::Number).to_string(), "t3");
        assert_eq!(Operand::Label(7).to_string(), "L7");
        assert_eq!(Operand::var("x", DataType::Number).to_string(), "x");
        assert_eq!(Operand::None.to_string(), "_");
    }
}
