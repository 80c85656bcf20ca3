//! Names the target shading language predefines. These resolve without a
//! declaration and are never emitted.

use crate::parser::lexer::BUILTIN_TYPES;

const BUILTIN_VARIABLES: &[&str] = &[
    "gl_Position",
    "gl_PointSize",
    "gl_FragCoord",
    "gl_FrontFacing",
    "gl_PointCoord",
    "gl_FragColor",
    "gl_FragData",
    "gl_FragDepth",
    "gl_VertexID",
    "gl_InstanceID",
    "gl_MaxVertexAttribs",
    "gl_MaxTextureImageUnits",
    "gl_MaxDrawBuffers",
];

const BUILTIN_FUNCTIONS: &[&str] = &[
    // angle and trigonometry
    "radians", "degrees", "sin", "cos", "tan", "asin", "acos", "atan",
    // exponential
    "pow", "exp", "log", "exp2", "log2", "sqrt", "inversesqrt",
    // common
    "abs", "sign", "floor", "ceil", "fract", "mod", "min", "max", "clamp", "mix", "step",
    "smoothstep",
    // geometric
    "length", "distance", "dot", "cross", "normalize", "faceforward", "reflect", "refract",
    // matrix and vector relational
    "matrixCompMult", "transpose", "inverse", "lessThan", "lessThanEqual", "greaterThan",
    "greaterThanEqual", "equal", "notEqual", "any", "all", "not",
    // texture lookup
    "texture", "texture2D", "texture2DProj", "texture2DLod", "texture2DLodEXT",
    "texture2DProjLod", "textureCube", "textureCubeLod", "textureCubeLodEXT", "textureLod",
    "shadow2D",
    // derivatives
    "dFdx", "dFdy", "fwidth",
];

/// Whether `name` is predefined: a built-in variable, function, or type
/// constructor.
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_VARIABLES.contains(&name)
        || BUILTIN_FUNCTIONS.contains(&name)
        || BUILTIN_TYPES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        assert!(is_builtin("gl_FragColor"));
        assert!(is_builtin("texture2D"));
        assert!(is_builtin("vec4"));
        assert!(!is_builtin("myHelper"));
    }
}
