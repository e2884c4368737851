//! The typed value model.
//!
//! One tagged representation for every value kind the schema layer needs:
//! scalars, enums, bits, and typed member lists. Equality is structural;
//! ordering is defined where YANG defines it (numerics, strings, enums by
//! integer value, bits by position).

use std::cmp::Ordering;

use smol_str::SmolStr;

use super::base::BaseType;

/// A named enumeration member with its assigned integer value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: SmolStr,
    pub value: i32,
}

impl EnumValue {
    pub fn new(name: impl Into<SmolStr>, value: i32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A named bit with its assigned position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bit {
    pub name: SmolStr,
    pub position: u32,
}

impl Bit {
    pub fn new(name: impl Into<SmolStr>, position: u32) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Placement policy when merging one list value into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeOrder {
    /// Prepend the incoming members.
    First,
    /// Append the incoming members.
    #[default]
    Last,
    /// Insert each member at its sorted position.
    Sorted,
}

/// A list of typed members, ordered or unordered.
///
/// The member base type is fixed at construction; every member is expected
/// to carry that type. For bits-typed lists the canonical ascending
/// position order is maintained on every insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListValue {
    btyp: BaseType,
    ordered: bool,
    members: Vec<TypedValue>,
}

impl ListValue {
    pub fn new(btyp: BaseType, ordered: bool) -> Self {
        Self {
            btyp,
            ordered,
            members: Vec::new(),
        }
    }

    pub fn base_type(&self) -> BaseType {
        self.btyp
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn members(&self) -> &[TypedValue] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Insert a member, preserving canonical order for bits values.
    pub fn push(&mut self, value: TypedValue) {
        if self.btyp == BaseType::Bits {
            let pos = self
                .members
                .partition_point(|m| m.bit_position() <= value.bit_position());
            self.members.insert(pos, value);
        } else {
            self.members.push(value);
        }
    }

    /// Membership test by structural equality.
    pub fn contains(&self, value: &TypedValue) -> bool {
        self.members.iter().any(|m| m == value)
    }

    /// Merge another list into this one under the given placement policy.
    /// Bits-typed lists ignore the policy; their canonical order wins.
    pub fn merge(&mut self, mut other: ListValue, order: MergeOrder) {
        if self.btyp == BaseType::Bits {
            for member in other.members.drain(..) {
                self.push(member);
            }
            return;
        }
        match order {
            MergeOrder::First => {
                other.members.append(&mut self.members);
                self.members = other.members;
            }
            MergeOrder::Last => self.members.append(&mut other.members),
            MergeOrder::Sorted => {
                for member in other.members.drain(..) {
                    let pos = self
                        .members
                        .partition_point(|m| m.partial_cmp(&member) != Some(Ordering::Greater));
                    self.members.insert(pos, member);
                }
            }
        }
    }

    /// Compare member-wise. Unordered lists compare as equal when they
    /// contain the same members regardless of position.
    pub fn compare(&self, other: &ListValue) -> Option<Ordering> {
        if !self.ordered && !other.ordered {
            if self.len() == other.len() && self.members.iter().all(|m| other.contains(m)) {
                return Some(Ordering::Equal);
            }
            return None;
        }
        for (a, b) in self.members.iter().zip(&other.members) {
            match a.partial_cmp(b) {
                Some(Ordering::Equal) => continue,
                non_eq => return non_eq,
            }
        }
        Some(self.len().cmp(&other.len()))
    }
}

/// A typed scalar or compound value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Uint(u64),
    /// decimal64 as scaled integer plus fraction digits, preserving the
    /// literal exactly.
    Decimal {
        scaled: i64,
        fraction_digits: u8,
    },
    Bool(bool),
    String(String),
    Enum(EnumValue),
    Bit(Bit),
    /// Presence-only value for `empty` leaves.
    Empty,
    Binary(Vec<u8>),
    List(ListValue),
}

impl Eq for TypedValue {}

impl TypedValue {
    /// The base type this value carries.
    pub fn base_type(&self) -> BaseType {
        match self {
            Self::Int(_) => BaseType::Int64,
            Self::Uint(_) => BaseType::Uint64,
            Self::Decimal { .. } => BaseType::Decimal64,
            Self::Bool(_) => BaseType::Boolean,
            Self::String(_) => BaseType::String,
            Self::Enum(_) => BaseType::Enumeration,
            Self::Bit(_) => BaseType::Bits,
            Self::Empty => BaseType::Empty,
            Self::Binary(_) => BaseType::Binary,
            Self::List(list) => list.base_type(),
        }
    }

    /// Bit position for bit members; u32::MAX for everything else so
    /// non-bit members sort to the end of a bits list.
    fn bit_position(&self) -> u32 {
        match self {
            Self::Bit(bit) => bit.position,
            _ => u32::MAX,
        }
    }

    /// Parse a literal into a value of the given base type, preserving the
    /// literal form for string-like types.
    pub fn parse(btyp: BaseType, literal: &str) -> Option<Self> {
        match btyp {
            BaseType::Int8 => literal.parse::<i8>().ok().map(|v| Self::Int(v as i64)),
            BaseType::Int16 => literal.parse::<i16>().ok().map(|v| Self::Int(v as i64)),
            BaseType::Int32 => literal.parse::<i32>().ok().map(|v| Self::Int(v as i64)),
            BaseType::Int64 => literal.parse::<i64>().ok().map(Self::Int),
            BaseType::Uint8 => literal.parse::<u8>().ok().map(|v| Self::Uint(v as u64)),
            BaseType::Uint16 => literal.parse::<u16>().ok().map(|v| Self::Uint(v as u64)),
            BaseType::Uint32 => literal.parse::<u32>().ok().map(|v| Self::Uint(v as u64)),
            BaseType::Uint64 => literal.parse::<u64>().ok().map(Self::Uint),
            BaseType::Boolean => match literal {
                "true" => Some(Self::Bool(true)),
                "false" => Some(Self::Bool(false)),
                _ => None,
            },
            BaseType::Empty => literal.is_empty().then_some(Self::Empty),
            BaseType::String | BaseType::Leafref | BaseType::InstanceId => {
                Some(Self::String(literal.to_string()))
            }
            _ => None,
        }
    }
}

impl PartialOrd for TypedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.partial_cmp(b),
            (Self::Uint(a), Self::Uint(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Uint(b)) => {
                if *a < 0 {
                    Some(Ordering::Less)
                } else {
                    (*a as u64).partial_cmp(b)
                }
            }
            (Self::Uint(a), Self::Int(b)) => {
                if *b < 0 {
                    Some(Ordering::Greater)
                } else {
                    a.partial_cmp(&(*b as u64))
                }
            }
            (
                Self::Decimal {
                    scaled: a,
                    fraction_digits: fa,
                },
                Self::Decimal {
                    scaled: b,
                    fraction_digits: fb,
                },
            ) if fa == fb => a.partial_cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            (Self::Enum(a), Self::Enum(b)) => a.value.partial_cmp(&b.value),
            (Self::Bit(a), Self::Bit(b)) => a.position.partial_cmp(&b.position),
            (Self::Empty, Self::Empty) => Some(Ordering::Equal),
            (Self::Binary(a), Self::Binary(b)) => a.partial_cmp(b),
            (Self::List(a), Self::List(b)) => a.compare(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BaseType::Uint32, "42", Some(TypedValue::Uint(42)))]
    #[case(BaseType::Uint8, "256", None)]
    #[case(BaseType::Int8, "-128", Some(TypedValue::Int(-128)))]
    #[case(BaseType::Boolean, "true", Some(TypedValue::Bool(true)))]
    #[case(BaseType::Boolean, "yes", None)]
    #[case(BaseType::Empty, "", Some(TypedValue::Empty))]
    fn test_parse_literal(
        #[case] btyp: BaseType,
        #[case] literal: &str,
        #[case] expected: Option<TypedValue>,
    ) {
        assert_eq!(TypedValue::parse(btyp, literal), expected);
    }

    #[test]
    fn test_mixed_sign_ordering() {
        let neg = TypedValue::Int(-1);
        let pos = TypedValue::Uint(1);
        assert_eq!(neg.partial_cmp(&pos), Some(Ordering::Less));
        assert_eq!(pos.partial_cmp(&neg), Some(Ordering::Greater));
    }

    #[test]
    fn test_bits_canonical_order() {
        let mut list = ListValue::new(BaseType::Bits, false);
        list.push(TypedValue::Bit(Bit::new("c", 9)));
        list.push(TypedValue::Bit(Bit::new("a", 1)));
        list.push(TypedValue::Bit(Bit::new("b", 4)));
        let positions: Vec<u32> = list
            .members()
            .iter()
            .map(|m| match m {
                TypedValue::Bit(b) => b.position,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(positions, vec![1, 4, 9]);
    }

    #[test]
    fn test_bits_merge_keeps_canonical_order() {
        let mut a = ListValue::new(BaseType::Bits, false);
        a.push(TypedValue::Bit(Bit::new("x", 5)));
        let mut b = ListValue::new(BaseType::Bits, false);
        b.push(TypedValue::Bit(Bit::new("y", 2)));
        b.push(TypedValue::Bit(Bit::new("z", 8)));
        a.merge(b, MergeOrder::First);
        let positions: Vec<u32> = a
            .members()
            .iter()
            .map(|m| match m {
                TypedValue::Bit(b) => b.position,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(positions, vec![2, 5, 8]);
    }

    #[rstest]
    #[case(MergeOrder::Last, &[10, 30, 20])]
    #[case(MergeOrder::First, &[20, 10, 30])]
    #[case(MergeOrder::Sorted, &[10, 20, 30])]
    fn test_merge_order(#[case] order: MergeOrder, #[case] expected: &[u64]) {
        let mut list = ListValue::new(BaseType::Uint64, true);
        list.push(TypedValue::Uint(10));
        list.push(TypedValue::Uint(30));
        let mut incoming = ListValue::new(BaseType::Uint64, true);
        incoming.push(TypedValue::Uint(20));
        list.merge(incoming, order);
        let got: Vec<u64> = list
            .members()
            .iter()
            .map(|m| match m {
                TypedValue::Uint(v) => *v,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_unordered_list_equality() {
        let mut a = ListValue::new(BaseType::String, false);
        a.push(TypedValue::String("x".into()));
        a.push(TypedValue::String("y".into()));
        let mut b = ListValue::new(BaseType::String, false);
        b.push(TypedValue::String("y".into()));
        b.push(TypedValue::String("x".into()));
        assert_eq!(a.compare(&b), Some(Ordering::Equal));
    }
}
