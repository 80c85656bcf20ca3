//! Render-state vocabulary shared by the parser, the AST and the compiler
//!
//! A render-state block (`BlendState`, `DepthState`, `StencilState`,
//! `RasterState`) assigns typed values to a fixed set of properties. The table
//! in [`RenderStateProperty`] decides which properties exist for each block and
//! which value category each accepts; the parser rejects anything else.

use crate::engine::{EngineEnumValue, EnumFamily};
use std::collections::BTreeMap;
use std::fmt;

/// The four render-state block kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderStateKind {
    Blend,
    Depth,
    Stencil,
    Raster,
}

impl RenderStateKind {
    pub fn keyword(self) -> &'static str {
        match self {
            RenderStateKind::Blend => "BlendState",
            RenderStateKind::Depth => "DepthState",
            RenderStateKind::Stencil => "StencilState",
            RenderStateKind::Raster => "RasterState",
        }
    }
}

impl fmt::Display for RenderStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// What a property accepts on the right-hand side (besides a variable name).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCategory {
    Bool,
    Number,
    Enum(EnumFamily),
}

impl fmt::Display for ValueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueCategory::Bool => f.write_str("a boolean"),
            ValueCategory::Number => f.write_str("a number"),
            ValueCategory::Enum(family) => write!(f, "a {} value", family),
        }
    }
}

/// Property, owning block, source name, value category, takes an index.
type PropertyRow = (RenderStateProperty, RenderStateKind, &'static str, ValueCategory, bool);

macro_rules! render_state_properties {
    ($($variant:ident => ($kind:ident, $name:literal, $category:expr, $indexed:literal)),+ $(,)?) => {
        /// Every assignable render-state property.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum RenderStateProperty {
            $($variant,)+
            /// Set through `RenderQueueType = ...;` rather than a block.
            RenderQueueType,
        }

        impl RenderStateProperty {
            const TABLE: &'static [PropertyRow] = &[
                $((RenderStateProperty::$variant, RenderStateKind::$kind, $name, $category, $indexed)),+
            ];
        }
    };
}

render_state_properties! {
    BlendEnabled => (Blend, "Enabled", ValueCategory::Bool, true),
    ColorWriteMask => (Blend, "ColorWriteMask", ValueCategory::Number, true),
    SrcColorBlendFactor => (Blend, "SrcColorBlendFactor", ValueCategory::Enum(EnumFamily::BlendFactor), true),
    DstColorBlendFactor => (Blend, "DstColorBlendFactor", ValueCategory::Enum(EnumFamily::BlendFactor), true),
    SrcAlphaBlendFactor => (Blend, "SrcAlphaBlendFactor", ValueCategory::Enum(EnumFamily::BlendFactor), true),
    DstAlphaBlendFactor => (Blend, "DstAlphaBlendFactor", ValueCategory::Enum(EnumFamily::BlendFactor), true),
    ColorBlendOperation => (Blend, "ColorBlendOperation", ValueCategory::Enum(EnumFamily::BlendOperation), true),
    AlphaBlendOperation => (Blend, "AlphaBlendOperation", ValueCategory::Enum(EnumFamily::BlendOperation), true),
    AlphaToCoverage => (Blend, "AlphaToCoverage", ValueCategory::Bool, false),
    DepthEnabled => (Depth, "Enabled", ValueCategory::Bool, false),
    DepthWriteEnabled => (Depth, "WriteEnabled", ValueCategory::Bool, false),
    DepthCompareFunction => (Depth, "CompareFunction", ValueCategory::Enum(EnumFamily::CompareFunction), false),
    StencilEnabled => (Stencil, "Enabled", ValueCategory::Bool, false),
    StencilReferenceValue => (Stencil, "ReferenceValue", ValueCategory::Number, false),
    StencilMask => (Stencil, "Mask", ValueCategory::Number, false),
    StencilWriteMask => (Stencil, "WriteMask", ValueCategory::Number, false),
    StencilCompareFunctionFront => (Stencil, "CompareFunctionFront", ValueCategory::Enum(EnumFamily::CompareFunction), false),
    StencilCompareFunctionBack => (Stencil, "CompareFunctionBack", ValueCategory::Enum(EnumFamily::CompareFunction), false),
    StencilPassOperationFront => (Stencil, "PassOperationFront", ValueCategory::Enum(EnumFamily::StencilOperation), false),
    StencilPassOperationBack => (Stencil, "PassOperationBack", ValueCategory::Enum(EnumFamily::StencilOperation), false),
    StencilFailOperationFront => (Stencil, "FailOperationFront", ValueCategory::Enum(EnumFamily::StencilOperation), false),
    StencilFailOperationBack => (Stencil, "FailOperationBack", ValueCategory::Enum(EnumFamily::StencilOperation), false),
    StencilZFailOperationFront => (Stencil, "ZFailOperationFront", ValueCategory::Enum(EnumFamily::StencilOperation), false),
    StencilZFailOperationBack => (Stencil, "ZFailOperationBack", ValueCategory::Enum(EnumFamily::StencilOperation), false),
    CullMode => (Raster, "CullMode", ValueCategory::Enum(EnumFamily::CullMode), false),
    DepthBias => (Raster, "DepthBias", ValueCategory::Number, false),
    SlopeScaledDepthBias => (Raster, "SlopeScaledDepthBias", ValueCategory::Number, false),
}

impl RenderStateProperty {
    /// Look up a property by its name inside a block of the given kind.
    pub fn from_name(kind: RenderStateKind, name: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(_, k, n, _, _)| *k == kind && *n == name)
            .map(|(p, ..)| *p)
    }

    fn row(self) -> Option<&'static PropertyRow> {
        Self::TABLE.iter().find(|(p, ..)| *p == self)
    }

    /// Source-level name; `None` for [`RenderStateProperty::RenderQueueType`].
    pub fn name(self) -> &'static str {
        self.row().map_or("RenderQueueType", |row| row.2)
    }

    pub fn kind(self) -> Option<RenderStateKind> {
        self.row().map(|row| row.1)
    }

    pub fn category(self) -> ValueCategory {
        self.row()
            .map_or(ValueCategory::Enum(EnumFamily::RenderQueueType), |row| row.3)
    }

    /// Whether the property may carry a `[n]` render-target index.
    pub fn is_indexed(self) -> bool {
        self.row().is_some_and(|row| row.4)
    }
}

impl fmt::Display for RenderStateProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "{}.{}", kind, self.name()),
            None => f.write_str(self.name()),
        }
    }
}

/// A render-state value as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderStateValue {
    Number(f64),
    Bool(bool),
    Enum(EngineEnumValue),
    /// Name of a material property resolved by the renderer at draw time.
    Variable(String),
}

impl RenderStateValue {
    /// Whether this value is acceptable for a property of `category`.
    pub fn fits(&self, category: ValueCategory) -> bool {
        match (self, category) {
            (RenderStateValue::Variable(_), _) => true,
            (RenderStateValue::Number(_), ValueCategory::Number) => true,
            (RenderStateValue::Bool(_), ValueCategory::Bool) => true,
            (RenderStateValue::Enum(v), ValueCategory::Enum(family)) => v.family() == family,
            _ => false,
        }
    }
}

impl fmt::Display for RenderStateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderStateValue::Number(n) => write!(f, "{}", n),
            RenderStateValue::Bool(b) => write!(f, "{}", b),
            RenderStateValue::Enum(v) => write!(f, "{}", v),
            RenderStateValue::Variable(name) => f.write_str(name),
        }
    }
}

/// Key of a resolved render-state entry: property plus optional target index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderStateKey {
    pub property: RenderStateProperty,
    pub index: Option<usize>,
}

impl RenderStateKey {
    pub fn new(property: RenderStateProperty, index: Option<usize>) -> Self {
        Self { property, index }
    }
}

impl fmt::Display for RenderStateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", self.property, i),
            None => write!(f, "{}", self.property),
        }
    }
}

/// Resolved render states of one pass, ordered for deterministic output.
pub type RenderStates = BTreeMap<RenderStateKey, RenderStateValue>;
