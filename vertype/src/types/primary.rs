use strum::{Display, EnumIs, EnumIter, FromRepr};

use crate::types::class::ClassRef;

/// Primitive (non-reference) types.
///
/// A primitive-typed parameter never accepts `null`. Values of primitive types travel
/// boxed inside [`Value`](crate::value::Value); see [`PrimitiveType::box_class`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIs, EnumIter, FromRepr)]
#[repr(u8)]
pub enum PrimitiveType {
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "i8")]
    I8,
    #[strum(serialize = "i16")]
    I16,
    #[strum(serialize = "char")]
    Char,
    #[strum(serialize = "i32")]
    I32,
    #[strum(serialize = "i64")]
    I64,
    #[strum(serialize = "f32")]
    F32,
    #[strum(serialize = "f64")]
    F64,
}

/// The numeric widening chain: `i8 -> i16 -> i32 -> i64 -> f32 -> f64`.
const NUMERIC_CHAIN: [PrimitiveType; 6] = [
    PrimitiveType::I8,
    PrimitiveType::I16,
    PrimitiveType::I32,
    PrimitiveType::I64,
    PrimitiveType::F32,
    PrimitiveType::F64,
];

impl PrimitiveType {
    #[inline]
    fn chain_position(self) -> Option<usize> {
        NUMERIC_CHAIN.iter().position(|p| *p == self)
    }

    /// Returns `true` if a value of type `self` may be implicitly widened to `target`.
    ///
    /// The relation is strict: a type never widens to itself. `char` joins the numeric
    /// chain at `i32`; `bool` widens to nothing.
    ///
    /// ```rust
    /// # use vertype::types::primary::PrimitiveType;
    /// assert!(PrimitiveType::I8.widens_to(PrimitiveType::F64));
    /// assert!(PrimitiveType::Char.widens_to(PrimitiveType::I64));
    /// assert!(!PrimitiveType::Char.widens_to(PrimitiveType::I16));
    /// assert!(!PrimitiveType::I64.widens_to(PrimitiveType::I32));
    /// ```
    pub fn widens_to(self, target: PrimitiveType) -> bool {
        let Some(to) = target.chain_position() else {
            return false;
        };

        match self {
            PrimitiveType::Bool => false,
            PrimitiveType::Char => PrimitiveType::I32
                .chain_position()
                .is_some_and(|entry| to >= entry),
            _ => self.chain_position().is_some_and(|from| from < to),
        }
    }

    /// Class used when a value of this primitive type is boxed.
    pub const fn box_class(self) -> ClassRef {
        match self {
            PrimitiveType::Bool => ClassRef::BOOLEAN,
            PrimitiveType::I8 => ClassRef::BYTE,
            PrimitiveType::I16 => ClassRef::SHORT,
            PrimitiveType::Char => ClassRef::CHARACTER,
            PrimitiveType::I32 => ClassRef::INTEGER,
            PrimitiveType::I64 => ClassRef::LONG,
            PrimitiveType::F32 => ClassRef::FLOAT,
            PrimitiveType::F64 => ClassRef::DOUBLE,
        }
    }

    /// Inverse of [`Self::box_class`].
    pub fn unboxed(class: ClassRef) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|p| p.box_class() == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn widening_is_irreflexive() {
        for p in PrimitiveType::iter() {
            assert!(!p.widens_to(p), "{p} must not widen to itself");
        }
    }

    #[test]
    fn widening_table() {
        use PrimitiveType::*;
        assert!(I8.widens_to(I16));
        assert!(I16.widens_to(I32));
        assert!(I32.widens_to(F32));
        assert!(F32.widens_to(F64));
        assert!(Char.widens_to(I32));
        assert!(Char.widens_to(F64));

        assert!(!I8.widens_to(Char));
        assert!(!I16.widens_to(Char));
        assert!(!Char.widens_to(I8));
        assert!(!F64.widens_to(F32));
        assert!(!Bool.widens_to(I32));
        assert!(!I32.widens_to(Bool));
    }

    #[test]
    fn boxing_round_trips() {
        for p in PrimitiveType::iter() {
            assert_eq!(PrimitiveType::unboxed(p.box_class()), Some(p));
        }
        assert_eq!(PrimitiveType::unboxed(ClassRef::STRING), None);
    }
}
