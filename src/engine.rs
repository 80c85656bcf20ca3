//! Engine enumerations consumed by render-state declarations
//!
//! The renderer owns these enumerations; the shader language only names them.
//! Each family is declared once through [`engine_enum!`], which also produces
//! the member table the lexer uses to recognise `Family.Member` keywords, so the
//! accepted keywords can never drift from the runtime values.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::OnceLock;

macro_rules! engine_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($member:ident = $value:expr),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u32)]
        pub enum $name {
            $($member = $value),+
        }

        impl $name {
            /// All members in declaration order.
            pub const MEMBERS: &'static [$name] = &[$($name::$member),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$member => stringify!($member)),+
                }
            }

            pub fn value(self) -> u32 {
                self as u32
            }
        }

        impl From<$name> for EngineEnumValue {
            fn from(v: $name) -> Self {
                EngineEnumValue::$name(v)
            }
        }
    };
}

engine_enum! {
    /// Blend factor applied to source or destination color/alpha.
    BlendFactor {
        Zero = 0,
        One = 1,
        SrcColor = 2,
        OneMinusSrcColor = 3,
        DstColor = 4,
        OneMinusDstColor = 5,
        SrcAlpha = 6,
        OneMinusSrcAlpha = 7,
        DstAlpha = 8,
        OneMinusDstAlpha = 9,
        SrcAlphaSaturate = 10,
        BlendColor = 11,
        OneMinusBlendColor = 12,
    }
}

engine_enum! {
    BlendOperation {
        Add = 0,
        Subtract = 1,
        ReverseSubtract = 2,
        Min = 3,
        Max = 4,
    }
}

engine_enum! {
    /// Comparison used by depth and stencil tests.
    CompareFunction {
        Never = 0,
        Less = 1,
        Equal = 2,
        LessEqual = 3,
        Greater = 4,
        NotEqual = 5,
        GreaterEqual = 6,
        Always = 7,
    }
}

engine_enum! {
    CullMode {
        Off = 0,
        Front = 1,
        Back = 2,
    }
}

engine_enum! {
    StencilOperation {
        Keep = 0,
        Zero = 1,
        Replace = 2,
        IncrementSaturate = 3,
        DecrementSaturate = 4,
        Invert = 5,
        IncrementWrap = 6,
        DecrementWrap = 7,
    }
}

engine_enum! {
    /// Render queue tier; the value is the queue's sort key.
    RenderQueueType {
        Opaque = 1000,
        AlphaTest = 2000,
        Transparent = 3000,
    }
}

/// The enum families that can appear as `Family.Member` keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnumFamily {
    BlendFactor,
    BlendOperation,
    CompareFunction,
    CullMode,
    StencilOperation,
    RenderQueueType,
}

impl EnumFamily {
    pub const ALL: [EnumFamily; 6] = [
        EnumFamily::BlendFactor,
        EnumFamily::BlendOperation,
        EnumFamily::CompareFunction,
        EnumFamily::CullMode,
        EnumFamily::StencilOperation,
        EnumFamily::RenderQueueType,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EnumFamily::BlendFactor => "BlendFactor",
            EnumFamily::BlendOperation => "BlendOperation",
            EnumFamily::CompareFunction => "CompareFunction",
            EnumFamily::CullMode => "CullMode",
            EnumFamily::StencilOperation => "StencilOperation",
            EnumFamily::RenderQueueType => "RenderQueueType",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        EnumFamily::ALL.into_iter().find(|f| f.name() == name)
    }

    fn members(self) -> Vec<EngineEnumValue> {
        match self {
            EnumFamily::BlendFactor => BlendFactor::MEMBERS.iter().map(|&m| m.into()).collect(),
            EnumFamily::BlendOperation => {
                BlendOperation::MEMBERS.iter().map(|&m| m.into()).collect()
            }
            EnumFamily::CompareFunction => {
                CompareFunction::MEMBERS.iter().map(|&m| m.into()).collect()
            }
            EnumFamily::CullMode => CullMode::MEMBERS.iter().map(|&m| m.into()).collect(),
            EnumFamily::StencilOperation => {
                StencilOperation::MEMBERS.iter().map(|&m| m.into()).collect()
            }
            EnumFamily::RenderQueueType => {
                RenderQueueType::MEMBERS.iter().map(|&m| m.into()).collect()
            }
        }
    }
}

impl fmt::Display for EnumFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A member of any engine enum family, compared by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EngineEnumValue {
    BlendFactor(BlendFactor),
    BlendOperation(BlendOperation),
    CompareFunction(CompareFunction),
    CullMode(CullMode),
    StencilOperation(StencilOperation),
    RenderQueueType(RenderQueueType),
}

impl EngineEnumValue {
    pub fn family(self) -> EnumFamily {
        match self {
            EngineEnumValue::BlendFactor(_) => EnumFamily::BlendFactor,
            EngineEnumValue::BlendOperation(_) => EnumFamily::BlendOperation,
            EngineEnumValue::CompareFunction(_) => EnumFamily::CompareFunction,
            EngineEnumValue::CullMode(_) => EnumFamily::CullMode,
            EngineEnumValue::StencilOperation(_) => EnumFamily::StencilOperation,
            EngineEnumValue::RenderQueueType(_) => EnumFamily::RenderQueueType,
        }
    }

    pub fn member_name(self) -> &'static str {
        match self {
            EngineEnumValue::BlendFactor(v) => v.name(),
            EngineEnumValue::BlendOperation(v) => v.name(),
            EngineEnumValue::CompareFunction(v) => v.name(),
            EngineEnumValue::CullMode(v) => v.name(),
            EngineEnumValue::StencilOperation(v) => v.name(),
            EngineEnumValue::RenderQueueType(v) => v.name(),
        }
    }

    pub fn value(self) -> u32 {
        match self {
            EngineEnumValue::BlendFactor(v) => v.value(),
            EngineEnumValue::BlendOperation(v) => v.value(),
            EngineEnumValue::CompareFunction(v) => v.value(),
            EngineEnumValue::CullMode(v) => v.value(),
            EngineEnumValue::StencilOperation(v) => v.value(),
            EngineEnumValue::RenderQueueType(v) => v.value(),
        }
    }
}

impl fmt::Display for EngineEnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.family(), self.member_name())
    }
}

/// One row of the generated keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumKeyword {
    pub family: EnumFamily,
    pub member: &'static str,
    pub value: EngineEnumValue,
}

struct KeywordTable {
    rows: Vec<EnumKeyword>,
    index: FxHashMap<(EnumFamily, &'static str), EngineEnumValue>,
}

static KEYWORD_TABLE: OnceLock<KeywordTable> = OnceLock::new();

fn table() -> &'static KeywordTable {
    KEYWORD_TABLE.get_or_init(|| {
        let rows: Vec<EnumKeyword> = EnumFamily::ALL
            .into_iter()
            .flat_map(|family| {
                family.members().into_iter().map(move |value| EnumKeyword {
                    family,
                    member: value.member_name(),
                    value,
                })
            })
            .collect();
        let index = rows
            .iter()
            .map(|row| ((row.family, row.member), row.value))
            .collect();
        KeywordTable { rows, index }
    })
}

/// Every `{family, member, value}` triple, grouped by family in declaration order.
pub fn keyword_table() -> &'static [EnumKeyword] {
    &table().rows
}

/// Resolve `Family.Member`.
pub fn lookup(family: EnumFamily, member: &str) -> Option<EngineEnumValue> {
    table().index.get(&(family, member)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_every_member() {
        let expected = BlendFactor::MEMBERS.len()
            + BlendOperation::MEMBERS.len()
            + CompareFunction::MEMBERS.len()
            + CullMode::MEMBERS.len()
            + StencilOperation::MEMBERS.len()
            + RenderQueueType::MEMBERS.len();
        assert_eq!(keyword_table().len(), expected);
    }

    #[test]
    fn test_lookup_by_identity() {
        assert_eq!(
            lookup(EnumFamily::BlendFactor, "SrcAlpha"),
            Some(EngineEnumValue::BlendFactor(BlendFactor::SrcAlpha))
        );
        assert_eq!(
            lookup(EnumFamily::RenderQueueType, "Transparent").map(|v| v.value()),
            Some(3000)
        );
        assert_eq!(lookup(EnumFamily::CullMode, "SrcAlpha"), None);
    }

    #[test]
    fn test_shared_member_names_stay_in_their_family() {
        // `Zero` exists in both BlendFactor and StencilOperation
        let blend = lookup(EnumFamily::BlendFactor, "Zero").unwrap();
        let stencil = lookup(EnumFamily::StencilOperation, "Zero").unwrap();
        assert_ne!(blend, stencil);
        assert_eq!(stencil.to_string(), "StencilOperation.Zero");
    }
}
