use arrayvec::ArrayVec;

use super::types::{ScalarType, Type};

pub type FloatVector = ArrayVec<f32, 4>;
pub type IntVector = ArrayVec<i32, 4>;
pub type BoolVector = ArrayVec<bool, 4>;

/// A single scalar value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Int(i32),
    Float(f32),
}
impl Primitive {
    pub fn zero(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Bool => Primitive::Bool(false),
            ScalarType::Int => Primitive::Int(0),
            ScalarType::Float => Primitive::Float(0.0),
        }
    }
}

/// Column-major square matrix.
///
/// Only the top-left `size`x`size` block is meaningful.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub size: u8,
    pub columns: [[f32; 4]; 4],
}
impl Matrix {
    pub fn identity(size: u8) -> Self {
        let mut columns = [[0.0; 4]; 4];
        for (i, column) in columns.iter_mut().enumerate().take(size as usize) {
            column[i] = 1.0;
        }
        Self { size, columns }
    }

    pub fn column(&self, idx: usize) -> FloatVector {
        self.columns[idx][..self.size as usize].iter().copied().collect()
    }
}

/// An owned, typed value: the result of evaluating an expression, or the current value of a uniform
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    FloatVector(FloatVector),
    IntVector(IntVector),
    BoolVector(BoolVector),
    Matrix(Matrix),
}
impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Bool(_) => Type::BOOL,
            Value::Int(_) => Type::INT,
            Value::Float(_) => Type::FLOAT,
            Value::FloatVector(v) => Type::vec(v.len() as u8),
            Value::IntVector(v) => Type::ivec(v.len() as u8),
            Value::BoolVector(v) => Type::bvec(v.len() as u8),
            Value::Matrix(m) => Type::mat(m.size),
        }
    }

    /// The default value of a type: zero, false, or the identity matrix
    pub fn zero(ty: Type) -> Self {
        match ty {
            Type::Scalar(ScalarType::Bool) => Value::Bool(false),
            Type::Scalar(ScalarType::Int) => Value::Int(0),
            Type::Scalar(ScalarType::Float) => Value::Float(0.0),
            Type::Vector(ScalarType::Bool, n) => Value::BoolVector((0..n).map(|_| false).collect()),
            Type::Vector(ScalarType::Int, n) => Value::IntVector((0..n).map(|_| 0).collect()),
            Type::Vector(ScalarType::Float, n) => Value::FloatVector((0..n).map(|_| 0.0).collect()),
            Type::Matrix(n) => Value::Matrix(Matrix::identity(n)),
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f32),
            _ => None,
        }
    }
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
    pub fn vec2(x: f32, y: f32) -> Self {
        Value::FloatVector([x, y].into_iter().collect())
    }
    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::FloatVector([x, y, z].into_iter().collect())
    }
    pub fn vec4(x: f32, y: f32, z: f32, w: f32) -> Self {
        Value::FloatVector(FloatVector::from([x, y, z, w]))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        fn list<T: std::fmt::Debug>(f: &mut std::fmt::Formatter, name: &str, items: &[T]) -> std::fmt::Result {
            write!(f, "{}{}(", name, items.len())?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}", item)?;
            }
            write!(f, ")")
        }
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::FloatVector(v) => list(f, "vec", v),
            Value::IntVector(v) => list(f, "ivec", v),
            Value::BoolVector(v) => list(f, "bvec", v),
            Value::Matrix(m) => {
                write!(f, "mat{}(", m.size)?;
                for c in 0..m.size as usize {
                    if c > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", m.column(c).as_slice())?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Storage for non-primitive results inside a [FunctionReturn]
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ObjectReturn {
    #[default]
    None,
    FloatVector(FloatVector),
    IntVector(IntVector),
    BoolVector(BoolVector),
    Matrix(Matrix),
}

/// The return slot threaded through every evaluation.
///
/// Only the field matching the static type of the evaluated expression holds its result,
/// so callers always read it back with the type they resolved.
#[derive(Debug, Clone, Default)]
pub struct FunctionReturn {
    pub float_return: f32,
    pub int_return: i32,
    pub boolean_return: bool,
    pub object_return: ObjectReturn,
}

impl FunctionReturn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_primitive(&self, ty: ScalarType) -> Primitive {
        match ty {
            ScalarType::Bool => Primitive::Bool(self.boolean_return),
            ScalarType::Int => Primitive::Int(self.int_return),
            ScalarType::Float => Primitive::Float(self.float_return),
        }
    }

    pub fn write_primitive(&mut self, value: Primitive) {
        match value {
            Primitive::Bool(b) => self.boolean_return = b,
            Primitive::Int(i) => self.int_return = i,
            Primitive::Float(f) => self.float_return = f,
        }
    }

    /// Component `idx` of the vector held in the object slot, as the given element type
    pub fn vector_component(&self, ty: ScalarType, idx: usize) -> Primitive {
        match (&self.object_return, ty) {
            (ObjectReturn::FloatVector(v), ScalarType::Float) => v.get(idx).map_or(Primitive::zero(ty), |x| Primitive::Float(*x)),
            (ObjectReturn::IntVector(v), ScalarType::Int) => v.get(idx).map_or(Primitive::zero(ty), |x| Primitive::Int(*x)),
            (ObjectReturn::BoolVector(v), ScalarType::Bool) => v.get(idx).map_or(Primitive::zero(ty), |x| Primitive::Bool(*x)),
            _ => Primitive::zero(ty),
        }
    }

    pub fn float_vector(&self) -> &[f32] {
        match &self.object_return {
            ObjectReturn::FloatVector(v) => v.as_slice(),
            _ => &[],
        }
    }

    pub fn int_vector(&self) -> &[i32] {
        match &self.object_return {
            ObjectReturn::IntVector(v) => v.as_slice(),
            _ => &[],
        }
    }

    pub fn matrix(&self) -> Option<&Matrix> {
        match &self.object_return {
            ObjectReturn::Matrix(m) => Some(m),
            _ => None,
        }
    }

    /// Store a vector built from primitives of one element type
    pub fn write_vector(&mut self, ty: ScalarType, components: &[Primitive]) {
        self.object_return = match ty {
            ScalarType::Float => ObjectReturn::FloatVector(
                components.iter().map(|p| if let Primitive::Float(x) = p { *x } else { 0.0 }).collect(),
            ),
            ScalarType::Int => ObjectReturn::IntVector(
                components.iter().map(|p| if let Primitive::Int(x) = p { *x } else { 0 }).collect(),
            ),
            ScalarType::Bool => ObjectReturn::BoolVector(
                components.iter().map(|p| matches!(p, Primitive::Bool(true))).collect(),
            ),
        };
    }

    /// Read the result of an expression with static type `ty`
    pub fn read(&self, ty: Type) -> Value {
        match ty {
            Type::Scalar(ScalarType::Bool) => Value::Bool(self.boolean_return),
            Type::Scalar(ScalarType::Int) => Value::Int(self.int_return),
            Type::Scalar(ScalarType::Float) => Value::Float(self.float_return),
            _ => match &self.object_return {
                ObjectReturn::FloatVector(v) => Value::FloatVector(v.clone()),
                ObjectReturn::IntVector(v) => Value::IntVector(v.clone()),
                ObjectReturn::BoolVector(v) => Value::BoolVector(v.clone()),
                ObjectReturn::Matrix(m) => Value::Matrix(*m),
                ObjectReturn::None => Value::zero(ty),
            },
        }
    }

    pub fn write(&mut self, value: &Value) {
        match value {
            Value::Bool(b) => self.boolean_return = *b,
            Value::Int(i) => self.int_return = *i,
            Value::Float(f) => self.float_return = *f,
            Value::FloatVector(v) => self.object_return = ObjectReturn::FloatVector(v.clone()),
            Value::IntVector(v) => self.object_return = ObjectReturn::IntVector(v.clone()),
            Value::BoolVector(v) => self.object_return = ObjectReturn::BoolVector(v.clone()),
            Value::Matrix(m) => self.object_return = ObjectReturn::Matrix(*m),
        }
    }
}
