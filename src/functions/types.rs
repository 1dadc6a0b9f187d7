use std::fmt::{Display, Formatter};

/// The primitive element types of the expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarType {
    Bool,
    Int,
    Float,
}

/// A type in the expression language.
///
/// Types are used as the keys of function signatures, so every value an expression can produce has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    Scalar(ScalarType),
    /// A vector of 2, 3 or 4 components
    Vector(ScalarType, u8),
    /// A square float matrix of size 2, 3 or 4
    Matrix(u8),
}

impl Type {
    pub const BOOL: Self = Self::Scalar(ScalarType::Bool);
    pub const INT: Self = Self::Scalar(ScalarType::Int);
    pub const FLOAT: Self = Self::Scalar(ScalarType::Float);

    pub const fn vec(n: u8) -> Self {
        Self::Vector(ScalarType::Float, n)
    }
    pub const fn ivec(n: u8) -> Self {
        Self::Vector(ScalarType::Int, n)
    }
    pub const fn bvec(n: u8) -> Self {
        Self::Vector(ScalarType::Bool, n)
    }
    pub const fn mat(n: u8) -> Self {
        Self::Matrix(n)
    }

    /// The type of one element of this type, or None for matrices
    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            Type::Scalar(s) | Type::Vector(s, _) => Some(*s),
            Type::Matrix(_) => None,
        }
    }

    /// Number of components: 1 for scalars, the width for vectors, the number of columns for matrices
    pub fn width(&self) -> u8 {
        match self {
            Type::Scalar(_) => 1,
            Type::Vector(_, n) | Type::Matrix(n) => *n,
        }
    }

    /// Every type a value can have, used to register type-generic functions such as `if`
    pub fn all() -> Vec<Type> {
        let mut types = vec![Type::BOOL, Type::INT, Type::FLOAT];
        for n in 2..=4 {
            types.push(Type::vec(n));
            types.push(Type::ivec(n));
            types.push(Type::bvec(n));
            types.push(Type::mat(n));
        }
        types
    }

    /// Parse a GLSL-style type name
    pub fn from_name(name: &str) -> Option<Type> {
        let ty = match name {
            "bool" => Type::BOOL,
            "int" => Type::INT,
            "float" => Type::FLOAT,
            "vec2" => Type::vec(2),
            "vec3" => Type::vec(3),
            "vec4" => Type::vec(4),
            "ivec2" => Type::ivec(2),
            "ivec3" => Type::ivec(3),
            "ivec4" => Type::ivec(4),
            "bvec2" => Type::bvec(2),
            "bvec3" => Type::bvec(3),
            "bvec4" => Type::bvec(4),
            "mat2" => Type::mat(2),
            "mat3" => Type::mat(3),
            "mat4" => Type::mat(4),
            _ => return None,
        };
        Some(ty)
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
        }
    }
}
impl Display for Type {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{}", s),
            Self::Vector(ScalarType::Float, n) => write!(f, "vec{}", n),
            Self::Vector(ScalarType::Int, n) => write!(f, "ivec{}", n),
            Self::Vector(ScalarType::Bool, n) => write!(f, "bvec{}", n),
            Self::Matrix(n) => write!(f, "mat{}", n),
        }
    }
}

/// Parameter and return types of a function.
///
/// A signature may end in a variadic parameter, which accepts zero or more further arguments of one type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub parameters: Vec<Type>,
    pub variadic: Option<Type>,
    pub return_type: Type,
}

impl Signature {
    pub fn new(parameters: Vec<Type>, return_type: Type) -> Self {
        Self {
            parameters,
            variadic: None,
            return_type,
        }
    }

    pub fn variadic(parameters: Vec<Type>, variadic: Type, return_type: Type) -> Self {
        Self {
            parameters,
            variadic: Some(variadic),
            return_type,
        }
    }

    pub fn accepts_arity(&self, n: usize) -> bool {
        match self.variadic {
            Some(_) => n >= self.parameters.len(),
            None => n == self.parameters.len(),
        }
    }

    /// The expected type of the argument at `idx`
    pub fn parameter(&self, idx: usize) -> Option<Type> {
        self.parameters.get(idx).copied().or(self.variadic)
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        if let Some(v) = self.variadic {
            if !self.parameters.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "{}...", v)?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}
