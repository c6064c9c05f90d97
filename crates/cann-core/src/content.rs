//! Static copy for the home screen.

pub const TITLE: &str = "CANN助手";
pub const SUBTITLE: &str = "华为昇腾硬件开发者的一站式AI解决方案";
pub const TAGLINE: &str = "专为算子开发工程师打造，提供智能问答、代码生成、技术支持等全方位服务";

pub struct Card {
    pub title: &'static str,
    pub description: &'static str,
}

pub static CAPABILITIES: &[Card] = &[
    Card {
        title: "工具类问题",
        description: "开发环境配置、工具链使用、编译调试等工具相关问题解答",
    },
    Card {
        title: "Ascend C API",
        description: "详细的API文档查询、使用示例和最佳实践指导",
    },
    Card {
        title: "算子精度问题",
        description: "算子精度分析、性能优化建议和问题诊断解决方案",
    },
    Card {
        title: "安装部署问题",
        description: "环境搭建、依赖安装、部署配置等全流程指导",
    },
    Card {
        title: "CANN文档",
        description: "智能文档检索、快速定位相关章节和详细说明",
    },
];

pub static FEATURES: &[Card] = &[
    Card {
        title: "AI智能问答",
        description: "基于CANN知识库的智能问答系统，快速获取准确答案",
    },
    Card {
        title: "AI算子开发",
        description: "智能生成Ascend C算子代码，提升开发效率",
    },
];

pub const USAGE_NOTES: &[&str] = &[
    "生成的代码已包含完整的算子框架",
    "请根据实际需求调整计算逻辑部分",
    "确保数据类型和形状配置正确",
    "建议进行充分的测试验证",
];
