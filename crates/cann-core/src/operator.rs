//! Operator configuration form model.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorCategory {
    Convolution,
    Pooling,
    Activation,
    Normalization,
    Reduction,
    #[default]
    Elementwise,
    Matrix,
    Custom,
}

impl OperatorCategory {
    pub fn all() -> Vec<OperatorCategory> {
        vec![
            OperatorCategory::Convolution,
            OperatorCategory::Pooling,
            OperatorCategory::Activation,
            OperatorCategory::Normalization,
            OperatorCategory::Reduction,
            OperatorCategory::Elementwise,
            OperatorCategory::Matrix,
            OperatorCategory::Custom,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            OperatorCategory::Convolution => "conv",
            OperatorCategory::Pooling => "pooling",
            OperatorCategory::Activation => "activation",
            OperatorCategory::Normalization => "norm",
            OperatorCategory::Reduction => "reduction",
            OperatorCategory::Elementwise => "element",
            OperatorCategory::Matrix => "matrix",
            OperatorCategory::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperatorCategory::Convolution => "卷积算子",
            OperatorCategory::Pooling => "池化算子",
            OperatorCategory::Activation => "激活函数",
            OperatorCategory::Normalization => "归一化算子",
            OperatorCategory::Reduction => "规约算子",
            OperatorCategory::Elementwise => "逐元素算子",
            OperatorCategory::Matrix => "矩阵算子",
            OperatorCategory::Custom => "自定义算子",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OperatorCategory::Convolution => "卷积神经网络中的卷积运算操作",
            OperatorCategory::Pooling => "在窗口内取最大值或平均值，用于降采样",
            OperatorCategory::Activation => "ReLU、Sigmoid、Tanh等逐元素非线性变换",
            OperatorCategory::Normalization => "BatchNorm、LayerNorm等归一化操作",
            OperatorCategory::Reduction => "沿指定维度进行求和、求最大值等规约操作",
            OperatorCategory::Elementwise => "对输入张量的每个元素进行相同操作",
            OperatorCategory::Matrix => "矩阵乘法、转置等矩阵运算操作",
            OperatorCategory::Custom => "根据具体需求定制的特殊算子",
        }
    }

    pub fn next(&self) -> Self {
        cycle(&Self::all(), *self, 1)
    }

    pub fn prev(&self) -> Self {
        cycle(&Self::all(), *self, -1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Float16,
    Float32,
    Int8,
    Int16,
    Int32,
    Uint8,
    Uint16,
    Uint32,
}

impl DataType {
    pub fn all() -> Vec<DataType> {
        vec![
            DataType::Float16,
            DataType::Float32,
            DataType::Int8,
            DataType::Int16,
            DataType::Int32,
            DataType::Uint8,
            DataType::Uint16,
            DataType::Uint32,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Float16 => "float16",
            DataType::Float32 => "float32",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Uint8 => "uint8",
            DataType::Uint16 => "uint16",
            DataType::Uint32 => "uint32",
        }
    }

    /// The `aclDataType` enumerator, e.g. `ACL_FLOAT16`.
    pub fn acl_keyword(&self) -> String {
        format!("ACL_{}", self.as_str().to_uppercase())
    }

    /// Element type used in Ascend C kernel code.
    pub fn kernel_type(&self) -> &'static str {
        match self {
            DataType::Float16 => "half",
            DataType::Float32 => "float",
            DataType::Int8 => "int8_t",
            DataType::Int16 => "int16_t",
            DataType::Int32 => "int32_t",
            DataType::Uint8 => "uint8_t",
            DataType::Uint16 => "uint16_t",
            DataType::Uint32 => "uint32_t",
        }
    }

    pub fn next(&self) -> Self {
        cycle(&Self::all(), *self, 1)
    }

    pub fn prev(&self) -> Self {
        cycle(&Self::all(), *self, -1)
    }
}

fn cycle<T: Copy + PartialEq>(items: &[T], current: T, step: isize) -> T {
    let len = items.len() as isize;
    let idx = items.iter().position(|i| *i == current).unwrap_or(0) as isize;
    items[((idx + step).rem_euclid(len)) as usize]
}

/// Transient form state consumed once to render a code skeleton.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSpec {
    pub name: String,
    pub category: OperatorCategory,
    pub description: String,
    pub input_shape: String,
    pub output_shape: String,
    pub data_type: DataType,
}

impl OperatorSpec {
    /// Check required fields and that the name can be used as a C++ class name.
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::MissingField("算子名称"));
        }
        if self.description.trim().is_empty() {
            return Err(CoreError::MissingField("功能描述"));
        }
        if !is_identifier(name) {
            return Err(CoreError::InvalidName(name.to_string()));
        }
        parse_shape("输入形状", &self.input_shape)?;
        parse_shape("输出形状", &self.output_shape)?;
        Ok(())
    }
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a shape such as `[1024, 512]`, `{N, C, H, W}` or `(M, K)` into its dims.
///
/// Returns an empty list for blank input. Each dim is a single operand or an
/// arithmetic chain like `H/2` or `N * C`; operators never sit next to each other.
pub fn parse_shape(field: &'static str, raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let invalid = || CoreError::InvalidShape {
        field,
        value: trimmed.to_string(),
    };

    let inner = strip_brackets(trimmed).ok_or_else(invalid)?;
    let dims: Vec<String> = inner.split(',').map(|d| d.trim().to_string()).collect();

    if dims.iter().all(|d| dim_regex().is_match(d)) {
        Ok(dims)
    } else {
        Err(invalid())
    }
}

fn dim_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]+(\s*[+\-*/]\s*[A-Za-z0-9_]+)*$").expect("dim pattern is valid")
    })
}

fn strip_brackets(s: &str) -> Option<&str> {
    let first = s.chars().next()?;
    let close = match first {
        '[' => ']',
        '{' => '}',
        '(' => ')',
        _ => return Some(s),
    };
    s.strip_prefix(first)?.strip_suffix(close)
}

/// A complete example configuration loadable in one keystroke.
pub struct OperatorPreset {
    pub key: &'static str,
    pub name: &'static str,
    pub category: OperatorCategory,
    pub description: &'static str,
    pub input_shape: &'static str,
    pub output_shape: &'static str,
    pub data_type: DataType,
}

pub static PRESETS: &[OperatorPreset] = &[
    OperatorPreset {
        key: "conv2d",
        name: "Conv2DOperator",
        category: OperatorCategory::Convolution,
        description: "2D卷积运算，支持多种卷积核大小和步长配置，适用于图像特征提取",
        input_shape: "[N, C, H, W]",
        output_shape: "[N, C_out, H_out, W_out]",
        data_type: DataType::Float16,
    },
    OperatorPreset {
        key: "relu",
        name: "ReLUOperator",
        category: OperatorCategory::Activation,
        description: "ReLU激活函数，将负数置零，保持正数不变，是深度学习中最常用的激活函数",
        input_shape: "[N, C, H, W]",
        output_shape: "[N, C, H, W]",
        data_type: DataType::Float16,
    },
    OperatorPreset {
        key: "pooling",
        name: "MaxPoolOperator",
        category: OperatorCategory::Pooling,
        description: "最大池化运算，在指定窗口内选择最大值，用于降采样和特征选择",
        input_shape: "[N, C, H, W]",
        output_shape: "[N, C, H/2, W/2]",
        data_type: DataType::Float16,
    },
    OperatorPreset {
        key: "matmul",
        name: "MatMulOperator",
        category: OperatorCategory::Matrix,
        description: "矩阵乘法运算，支持批量矩阵乘法，针对昇腾硬件优化的高性能实现",
        input_shape: "[M, K]",
        output_shape: "[M, N]",
        data_type: DataType::Float16,
    },
];

impl OperatorPreset {
    pub fn find(key: &str) -> Option<&'static OperatorPreset> {
        PRESETS.iter().find(|p| p.key == key)
    }

    pub fn to_spec(&self) -> OperatorSpec {
        OperatorSpec {
            name: self.name.to_string(),
            category: self.category,
            description: self.description.to_string(),
            input_shape: self.input_shape.to_string(),
            output_shape: self.output_shape.to_string(),
            data_type: self.data_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, description: &str) -> OperatorSpec {
        OperatorSpec {
            name: name.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_requires_name_and_description() {
        assert!(matches!(spec("", "desc").validate(), Err(CoreError::MissingField("算子名称"))));
        assert!(matches!(spec("   ", "desc").validate(), Err(CoreError::MissingField("算子名称"))));
        assert!(matches!(spec("Foo", " ").validate(), Err(CoreError::MissingField("功能描述"))));
        assert!(spec("Foo", "desc").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_identifier_names() {
        for bad in ["1Foo", "Foo Bar", "Foo;", "Foo{}", "类名"] {
            let err = spec(bad, "desc").validate().unwrap_err();
            assert!(matches!(err, CoreError::InvalidName(_)), "{}", bad);
            assert!(err.is_validation());
        }
        assert!(spec("_foo_2", "desc").validate().is_ok());
    }

    #[test]
    fn test_parse_shape_accepts_bracket_styles() {
        assert_eq!(parse_shape("s", "[1024, 512]").unwrap(), vec!["1024", "512"]);
        assert_eq!(parse_shape("s", "{N, C, H, W}").unwrap().len(), 4);
        assert_eq!(parse_shape("s", "(M,K)").unwrap(), vec!["M", "K"]);
        assert_eq!(parse_shape("s", "8, 16").unwrap(), vec!["8", "16"]);
        assert_eq!(parse_shape("s", "[N, C, H/2, W/2]").unwrap()[3], "W/2");
        assert!(parse_shape("s", "  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_shape_rejects_injection() {
        assert!(parse_shape("s", "[1, 2]; system(\"rm\")").is_err());
        assert!(parse_shape("s", "[1, ]").is_err());
        assert!(parse_shape("s", "[1, 2").is_err());
        assert!(parse_shape("s", "{1}}").is_err());
        for bad in ["[a*/b]", "[H/*x]", "[N//c]", "[1 2]", "[-1]", "[N*]", "[N, C */]"] {
            assert!(parse_shape("s", bad).is_err(), "{}", bad);
        }
        assert_eq!(parse_shape("s", "[N * C, H - 1]").unwrap(), vec!["N * C", "H - 1"]);
    }

    #[test]
    fn test_data_type_keywords() {
        assert_eq!(DataType::Float16.acl_keyword(), "ACL_FLOAT16");
        assert_eq!(DataType::Uint32.acl_keyword(), "ACL_UINT32");
        assert_eq!(DataType::Float16.kernel_type(), "half");
    }

    #[test]
    fn test_cycling_wraps() {
        assert_eq!(DataType::Uint32.next(), DataType::Float16);
        assert_eq!(DataType::Float16.prev(), DataType::Uint32);
        assert_eq!(OperatorCategory::Custom.next(), OperatorCategory::Convolution);
    }

    #[test]
    fn test_presets_are_valid() {
        for preset in PRESETS {
            assert!(preset.to_spec().validate().is_ok(), "{}", preset.key);
        }
        assert_eq!(OperatorPreset::find("relu").unwrap().name, "ReLUOperator");
        assert!(OperatorPreset::find("softmax").is_none());
    }
}
