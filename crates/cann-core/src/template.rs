//! Operator boilerplate generation.
//!
//! Skeletons are plain strings with `{{placeholder}}` markers. Rendering is a
//! single regex pass with a closure replacer: values are inserted literally,
//! so `$1` or `{{name}}` typed by the user is never expanded again.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::Result;
use crate::operator::{parse_shape, OperatorCategory, OperatorSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Host-side AscendCL operator class
    #[default]
    AclOperator,
    /// Device-side Ascend C kernel
    AscendKernel,
}

impl TemplateKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            TemplateKind::AclOperator => "AscendCL 算子类",
            TemplateKind::AscendKernel => "Ascend C 核函数",
        }
    }

    pub fn language_label(&self) -> &'static str {
        match self {
            TemplateKind::AclOperator => "C++ / AscendCL",
            TemplateKind::AscendKernel => "Ascend C",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            TemplateKind::AclOperator => TemplateKind::AscendKernel,
            TemplateKind::AscendKernel => TemplateKind::AclOperator,
        }
    }

    pub fn file_name(&self, operator_name: &str) -> String {
        let base = if operator_name.trim().is_empty() { "CustomOperator" } else { operator_name.trim() };
        match self {
            TemplateKind::AclOperator => format!("{}.cpp", base),
            TemplateKind::AscendKernel => format!("{}_kernel.cpp", base),
        }
    }

    fn skeleton(&self) -> &'static str {
        match self {
            TemplateKind::AclOperator => ACL_OPERATOR_SKELETON,
            TemplateKind::AscendKernel => ASCEND_KERNEL_SKELETON,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub kind: TemplateKind,
    pub file_name: String,
    pub language_label: &'static str,
    pub source: String,
}

const DEFAULT_INPUT_SHAPE: &str = "{1, 3, 224, 224}";
const DEFAULT_OUTPUT_SHAPE: &str = "{1, 64, 112, 112}";

const ACL_OPERATOR_SKELETON: &str = r#"#include "acl/acl.h"
#include "ascend_c_api.h"
#include "aclnn/aclnn_base.h"

/**
 * {{description}}
 * 算子类型: {{category_label}}
 * {{shape_comment}}
 * 数据类型: {{dtype}}
 */

class {{class_name}} {
private:
    // 算子参数
    aclOpExecutor* executor_;
    aclTensorDesc* inputDesc_;
    aclTensorDesc* outputDesc_;

    // 计算资源
    aclrtStream stream_;
    aclrtContext context_;

public:
    {{class_name}}() : executor_(nullptr), inputDesc_(nullptr),
                     outputDesc_(nullptr), stream_(nullptr), context_(nullptr) {}

    ~{{class_name}}() {
        Finalize();
    }

    /**
     * 初始化算子
     * @param deviceId 设备ID
     * @return 错误码
     */
    aclError Init(int32_t deviceId = 0) {
        aclError ret = aclrtSetDevice(deviceId);
        if (ret != ACL_SUCCESS) {
            printf("设置设备失败, 错误码: %d\n", ret);
            return ret;
        }

        ret = aclrtCreateContext(&context_, deviceId);
        if (ret != ACL_SUCCESS) {
            printf("创建上下文失败, 错误码: %d\n", ret);
            return ret;
        }

        ret = aclrtCreateStream(&stream_);
        if (ret != ACL_SUCCESS) {
            printf("创建流失败, 错误码: %d\n", ret);
            return ret;
        }

        printf("{{class_name}} 初始化成功\n");
        return ACL_SUCCESS;
    }

    /**
     * 设置输入输出描述符
     */
    aclError SetTensorDesc(const std::vector<int64_t>& inputShape,
                          const std::vector<int64_t>& outputShape,
                          aclDataType dataType = {{acl_dtype}}) {
        inputDesc_ = aclCreateTensorDesc(dataType, inputShape.size(),
                                        inputShape.data(), ACL_FORMAT_ND);
        if (inputDesc_ == nullptr) {
            printf("创建输入张量描述符失败\n");
            return ACL_ERROR_FAILURE;
        }

        outputDesc_ = aclCreateTensorDesc(dataType, outputShape.size(),
                                         outputShape.data(), ACL_FORMAT_ND);
        if (outputDesc_ == nullptr) {
            printf("创建输出张量描述符失败\n");
            return ACL_ERROR_FAILURE;
        }

        return ACL_SUCCESS;
    }

    /**
     * 执行算子计算
     * @param inputData 输入数据
     * @param outputData 输出数据
     * @return 错误码
     */
    aclError Process(const void* inputData, void* outputData) {
        if (!inputData || !outputData) {
            printf("输入或输出数据为空\n");
            return ACL_ERROR_INVALID_PARAM;
        }

{{compute}}

        aclError ret = aclrtSynchronizeStream(stream_);
        if (ret != ACL_SUCCESS) {
            printf("流同步失败, 错误码: %d\n", ret);
            return ret;
        }

        return ACL_SUCCESS;
    }

    /**
     * 释放资源
     */
    aclError Finalize() {
        aclError ret = ACL_SUCCESS;

        if (inputDesc_) {
            aclDestroyTensorDesc(inputDesc_);
            inputDesc_ = nullptr;
        }

        if (outputDesc_) {
            aclDestroyTensorDesc(outputDesc_);
            outputDesc_ = nullptr;
        }

        if (stream_) {
            ret = aclrtDestroyStream(stream_);
            stream_ = nullptr;
        }

        if (context_) {
            ret = aclrtDestroyContext(context_);
            context_ = nullptr;
        }

        return ret;
    }
};

/**
 * 使用示例
 */
int main() {
    aclError ret = aclInit(nullptr);
    if (ret != ACL_SUCCESS) {
        printf("ACL初始化失败\n");
        return -1;
    }

    {{class_name}} operator_instance;

    ret = operator_instance.Init();
    if (ret != ACL_SUCCESS) {
        printf("算子初始化失败\n");
        aclFinalize();
        return -1;
    }

    std::vector<int64_t> inputShape = {{input_shape}};
    std::vector<int64_t> outputShape = {{output_shape}};

    ret = operator_instance.SetTensorDesc(inputShape, outputShape);
    if (ret != ACL_SUCCESS) {
        printf("设置张量描述符失败\n");
        aclFinalize();
        return -1;
    }

    // 准备输入数据和输出缓冲区后调用 Process
    // ret = operator_instance.Process(inputData, outputData);

    printf("{{class_name}} 执行完成\n");

    aclFinalize();
    return 0;
}
"#;

const ASCEND_KERNEL_SKELETON: &str = r#"#include "kernel_operator.h"
using namespace AscendC;

constexpr int32_t BUFFER_NUM = 2;

// {{description}}
// 算子类型: {{category_label}}
// {{shape_comment}}
// 数据类型: {{dtype}}
class {{class_name}}Kernel {
private:
    GlobalTensor<{{ctype}}> inputGM;
    GlobalTensor<{{ctype}}> outputGM;

    TPipe pipe;
    TQue<QuePosition::VECIN, BUFFER_NUM> inputQueue;
    TQue<QuePosition::VECOUT, BUFFER_NUM> outputQueue;

public:
    __aicore__ inline {{class_name}}Kernel() {}

    __aicore__ inline void Init(GM_ADDR input, GM_ADDR output, uint32_t totalLength) {
        inputGM.SetGlobalBuffer((__gm__ {{ctype}}*)input, totalLength);
        outputGM.SetGlobalBuffer((__gm__ {{ctype}}*)output, totalLength);

        pipe.InitBuffer(inputQueue, BUFFER_NUM, totalLength * sizeof({{ctype}}));
        pipe.InitBuffer(outputQueue, BUFFER_NUM, totalLength * sizeof({{ctype}}));
    }

    __aicore__ inline void Process(uint32_t totalLength) {
        uint32_t loopCount = totalLength / BUFFER_NUM;

        for (uint32_t i = 0; i < loopCount; i++) {
            CopyIn(i, BUFFER_NUM);
            Compute(i, BUFFER_NUM);
            CopyOut(i, BUFFER_NUM);
        }
    }

private:
    __aicore__ inline void CopyIn(uint32_t progress, uint32_t length) {
        LocalTensor<{{ctype}}> inputLocal = inputQueue.AllocTensor<{{ctype}}>();
        DataCopy(inputLocal, inputGM[progress * length], length);
        inputQueue.EnQue(inputLocal);
    }

    __aicore__ inline void Compute(uint32_t progress, uint32_t length) {
        LocalTensor<{{ctype}}> inputLocal = inputQueue.DeQue<{{ctype}}>();
        LocalTensor<{{ctype}}> outputLocal = outputQueue.AllocTensor<{{ctype}}>();

{{compute}}

        outputQueue.EnQue<{{ctype}}>(outputLocal);
        inputQueue.FreeTensor(inputLocal);
    }

    __aicore__ inline void CopyOut(uint32_t progress, uint32_t length) {
        LocalTensor<{{ctype}}> outputLocal = outputQueue.DeQue<{{ctype}}>();
        DataCopy(outputGM[progress * length], outputLocal, length);
        outputQueue.FreeTensor(outputLocal);
    }
};

extern "C" __global__ __aicore__ void {{name_lower}}_kernel(
    GM_ADDR input,
    GM_ADDR output,
    GM_ADDR workspace,
    GM_ADDR tiling
) {
    GET_TILING_DATA(tiling_data, tiling);

    {{class_name}}Kernel op;
    op.Init(input, output, tiling_data.totalLength);
    op.Process(tiling_data.totalLength);
}
"#;

fn compute_snippet(kind: TemplateKind, category: OperatorCategory) -> &'static str {
    match (kind, category) {
        (TemplateKind::AclOperator, OperatorCategory::Convolution) => {
            "        // 卷积计算逻辑
        // 1. 配置卷积参数（步长、填充、膨胀等）
        // 2. 调用卷积计算API
        // 3. 处理输出数据"
        }
        (TemplateKind::AclOperator, OperatorCategory::Pooling) => {
            "        // 池化计算逻辑
        // 1. 配置池化参数（窗口大小、步长等）
        // 2. 选择池化类型（最大池化/平均池化）
        // 3. 执行池化计算"
        }
        (TemplateKind::AclOperator, OperatorCategory::Activation) => {
            "        // 激活函数计算逻辑
        // 1. 选择激活函数类型（ReLU、Sigmoid、Tanh等）
        // 2. 配置激活函数参数
        // 3. 执行逐元素激活计算"
        }
        (TemplateKind::AclOperator, OperatorCategory::Normalization) => {
            "        // 归一化计算逻辑
        // 1. 计算均值与方差
        // 2. 应用缩放与偏移参数
        // 3. 输出归一化结果"
        }
        (TemplateKind::AclOperator, OperatorCategory::Reduction) => {
            "        // 规约计算逻辑
        // 1. 确定规约维度
        // 2. 选择规约方式（求和、最大值、均值等）
        // 3. 写回规约结果"
        }
        (TemplateKind::AclOperator, OperatorCategory::Elementwise) => {
            "        // 逐元素计算逻辑
        // 1. 按元素读取输入
        // 2. 执行逐元素运算
        // 3. 写回输出"
        }
        (TemplateKind::AclOperator, OperatorCategory::Matrix) => {
            "        // 矩阵计算逻辑
        // 1. 检查矩阵维度是否匹配
        // 2. 调用矩阵乘法API
        // 3. 处理输出数据"
        }
        (TemplateKind::AclOperator, OperatorCategory::Custom) => {
            "        // 自定义算子计算逻辑
        // 1. 根据算子功能实现具体计算
        // 2. 优化内存访问模式
        // 3. 确保计算精度和性能"
        }
        (TemplateKind::AscendKernel, OperatorCategory::Convolution) => {
            "        // 卷积操作示例
        Conv2D(outputLocal, inputLocal, length);"
        }
        (TemplateKind::AscendKernel, OperatorCategory::Pooling) => {
            "        // 池化操作示例
        MaxPool(outputLocal, inputLocal, length);"
        }
        (TemplateKind::AscendKernel, OperatorCategory::Activation) => {
            "        // 激活函数示例
        Relu(outputLocal, inputLocal, length);"
        }
        (TemplateKind::AscendKernel, OperatorCategory::Normalization) => {
            "        // 归一化操作示例
        LayerNorm(outputLocal, inputLocal, length);"
        }
        (TemplateKind::AscendKernel, OperatorCategory::Reduction) => {
            "        // 规约操作示例
        ReduceSum(outputLocal, inputLocal, length);"
        }
        (TemplateKind::AscendKernel, OperatorCategory::Elementwise) => {
            "        // 逐元素操作示例
        Add(outputLocal, inputLocal, inputLocal, length);"
        }
        (TemplateKind::AscendKernel, OperatorCategory::Matrix) => {
            "        // 矩阵操作示例
        MatMul(outputLocal, inputLocal, inputLocal, length);"
        }
        (TemplateKind::AscendKernel, OperatorCategory::Custom) => {
            "        // 自定义操作逻辑
        // 在这里实现您的算子逻辑"
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([a-z_]+)\}\}").expect("placeholder pattern is valid"))
}

/// Flatten free text so it stays inside a `//` or `/* */` comment.
fn comment_safe(text: &str) -> String {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace("*/", "* /")
}

fn initializer(dims: &[String], default: &str) -> String {
    if dims.is_empty() {
        default.to_string()
    } else {
        format!("{{{}}}", dims.join(", "))
    }
}

/// Replace every `{{key}}` in `skeleton`. Unknown keys are left untouched.
pub fn fill(skeleton: &str, values: &HashMap<&str, String>) -> String {
    placeholder_regex()
        .replace_all(skeleton, |caps: &Captures<'_>| match values.get(&caps[1]) {
            Some(v) => v.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Validate `spec` and render the chosen skeleton.
pub fn render(kind: TemplateKind, spec: &OperatorSpec) -> Result<GeneratedCode> {
    spec.validate()?;

    let name = spec.name.trim();
    let input_dims = parse_shape("输入形状", &spec.input_shape)?;
    let output_dims = parse_shape("输出形状", &spec.output_shape)?;

    let shape_comment = if input_dims.is_empty() && output_dims.is_empty() {
        "输入/输出形状: 使用默认值".to_string()
    } else {
        format!(
            "输入形状: {}, 输出形状: {}",
            initializer(&input_dims, DEFAULT_INPUT_SHAPE),
            initializer(&output_dims, DEFAULT_OUTPUT_SHAPE)
        )
    };

    let mut values: HashMap<&str, String> = HashMap::new();
    values.insert("class_name", name.to_string());
    values.insert("name_lower", name.to_lowercase());
    values.insert("description", comment_safe(&spec.description));
    values.insert("category_label", spec.category.label().to_string());
    values.insert("shape_comment", comment_safe(&shape_comment));
    values.insert("dtype", spec.data_type.as_str().to_string());
    values.insert("acl_dtype", spec.data_type.acl_keyword());
    values.insert("ctype", spec.data_type.kernel_type().to_string());
    values.insert("input_shape", initializer(&input_dims, DEFAULT_INPUT_SHAPE));
    values.insert("output_shape", initializer(&output_dims, DEFAULT_OUTPUT_SHAPE));
    values.insert("compute", compute_snippet(kind, spec.category).to_string());

    let source = fill(kind.skeleton(), &values);

    tracing::debug!(
        "Rendered {} for {} ({} bytes)",
        kind.display_name(),
        name,
        source.len()
    );

    Ok(GeneratedCode {
        kind,
        file_name: kind.file_name(name),
        language_label: kind.language_label(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::DataType;

    fn foo_spec() -> OperatorSpec {
        OperatorSpec {
            name: "Foo".to_string(),
            category: OperatorCategory::Convolution,
            description: "test operator".to_string(),
            input_shape: "[1024, 512]".to_string(),
            output_shape: String::new(),
            data_type: DataType::Float16,
        }
    }

    #[test]
    fn test_fill_leaves_unknown_keys() {
        let mut values = HashMap::new();
        values.insert("a", "1".to_string());
        assert_eq!(fill("{{a}} {{b}}", &values), "1 {{b}}");
    }

    #[test]
    fn test_fill_is_single_pass() {
        let mut values = HashMap::new();
        values.insert("a", "{{b}} $1 ${b}".to_string());
        values.insert("b", "X".to_string());
        assert_eq!(fill("[{{a}}]", &values), "[{{b}} $1 ${b}]");
    }

    #[test]
    fn test_comment_safe() {
        assert_eq!(comment_safe("line one\n  line two\r\n"), "line one line two");
        assert_eq!(comment_safe("end */ int x;"), "end * / int x;");
    }

    #[test]
    fn test_acl_render_substitutes_everything() {
        let code = render(TemplateKind::AclOperator, &foo_spec()).unwrap();
        assert!(code.source.contains("class Foo {"));
        assert!(code.source.contains("aclDataType dataType = ACL_FLOAT16"));
        assert!(code.source.contains("std::vector<int64_t> inputShape = {1024, 512};"));
        assert!(code.source.contains(&format!("outputShape = {};", DEFAULT_OUTPUT_SHAPE)));
        assert!(code.source.contains("卷积计算逻辑"));
        assert!(!code.source.contains("{{"));
        assert_eq!(code.file_name, "Foo.cpp");
    }

    #[test]
    fn test_kernel_render_substitutes_everything() {
        let mut spec = foo_spec();
        spec.category = OperatorCategory::Elementwise;
        spec.data_type = DataType::Float32;

        let code = render(TemplateKind::AscendKernel, &spec).unwrap();
        assert!(code.source.contains("class FooKernel {"));
        assert!(code.source.contains("GlobalTensor<float> inputGM;"));
        assert!(code.source.contains("void foo_kernel("));
        assert!(code.source.contains("Add(outputLocal, inputLocal, inputLocal, length);"));
        assert!(!code.source.contains("{{"));
        assert_eq!(code.file_name, "Foo_kernel.cpp");
        assert_eq!(code.language_label, "Ascend C");
    }

    #[test]
    fn test_every_category_has_snippets() {
        for kind in [TemplateKind::AclOperator, TemplateKind::AscendKernel] {
            for category in OperatorCategory::all() {
                assert!(!compute_snippet(kind, category).is_empty());
            }
        }
    }

    #[test]
    fn test_file_name_default() {
        assert_eq!(TemplateKind::AclOperator.file_name(""), "CustomOperator.cpp");
        assert_eq!(TemplateKind::AclOperator.toggle(), TemplateKind::AscendKernel);
    }
}
