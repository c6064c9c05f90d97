//! Rule-based reply selection for the Q&A screen.
//!
//! Input is lowercased and tested against an ordered table of keyword groups.
//! The first group with any keyword contained in the input wins; there is no
//! scoring. Inputs matching nothing get a fallback that echoes the question.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Installation,
    Api,
    Precision,
    Performance,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Installation => "installation",
            Topic::Api => "api",
            Topic::Precision => "precision",
            Topic::Performance => "performance",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Topic::Installation => "安装配置",
            Topic::Api => "API",
            Topic::Precision => "精度调试",
            Topic::Performance => "性能优化",
        }
    }
}

/// A reference shown under an assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub topic: Option<Topic>,
    pub text: String,
    pub sources: Vec<Source>,
}

pub struct KeywordRule {
    pub topic: Topic,
    pub keywords: &'static [&'static str],
    pub response: &'static str,
    pub sources: &'static [(&'static str, &'static str)],
}

const DOCS_URL: &str = "https://www.hiascend.com/document";

/// Canned questions offered in the Q&A sidebar.
pub const QUICK_QUESTIONS: &[&str] = &[
    "如何配置CANN开发环境？",
    "Ascend C API的基本使用方法",
    "算子精度问题如何排查？",
    "CANN安装过程中常见错误解决",
    "如何优化算子性能？",
    "昇腾硬件支持哪些数据类型？",
];

const INSTALLATION_REPLY: &str = "关于CANN环境安装配置，我为您提供以下指导：

**🔧 安装步骤：**
1. 下载CANN软件包：从华为昇腾官网获取最新版本
2. 安装依赖：确保系统满足Python 3.7+、GCC 7.3+等要求
3. 执行安装：运行安装脚本并配置环境变量
4. 验证安装：使用示例代码验证环境是否正常

**💡 配置建议：**
- 建议使用虚拟环境隔离CANN依赖
- 配置ASCEND_OPP_PATH等关键环境变量
- 确保昇腾硬件驱动版本匹配

需要更详细的安装指导吗？我可以为您提供具体的命令和配置示例。";

const API_REPLY: &str = "Ascend C API是CANN的核心编程接口，主要包括：

**🔧 核心API模块：**
- **ACL Runtime API**：设备管理、内存管理、流管理
- **算子开发API**：Kernel开发、算子注册、参数配置
- **图执行API**：计算图构建、优化、执行
- **调试分析API**：性能分析、精度调试

**📝 使用示例：**
```cpp
// 设备初始化
aclError ret = aclInit(nullptr);
aclrtContext context;
aclrtCreateContext(&context, 0);

// 内存分配
void* devicePtr;
aclrtMalloc(&devicePtr, dataSize, ACL_MEM_MALLOC_HUGE_FIRST);
```

您想了解哪个具体API的使用方法呢？";

const PRECISION_REPLY: &str = "算子精度问题是开发中的常见挑战，以下是系统性的解决方案：

**🔍 精度问题诊断：**
- 使用CANN提供的精度比较工具
- 设置合适的精度阈值进行验证
- 分析数值溢出和下溢问题

**🛠️ 调试工具：**
- **msaccucmp.py**：精度比较工具
- **dump工具**：中间结果导出分析
- **profiling工具**：性能和精度联合分析

**💡 优化策略：**
- 选择合适的数据类型（FP16/FP32）
- 优化量化策略
- 使用混合精度训练技术

您遇到的具体精度问题是什么类型呢？我可以提供更针对性的解决方案。";

const PERFORMANCE_REPLY: &str = "CANN性能优化是一个系统工程，涉及多个层面：

**🚀 性能优化策略：**
- **算子级优化**：使用高效的计算模式，优化内存访问模式
- **图级优化**：算子融合、内存复用、并行执行
- **系统级优化**：多卡并行、流水线优化

**🔧 优化工具：**
- **Profiler**：性能瓶颈分析
- **Advisor**：优化建议生成
- **Tuner**：自动调优工具

**📊 性能指标：**
- 吞吐量（Throughput）
- 延迟（Latency）
- 内存使用效率
- 计算单元利用率

您的应用场景是什么？我可以提供更具体的性能优化建议。";

/// Ordered rule table. Order is significant: earlier rules win.
pub static RULES: &[KeywordRule] = &[
    KeywordRule {
        topic: Topic::Installation,
        keywords: &["安装", "环境", "配置"],
        response: INSTALLATION_REPLY,
        sources: &[("CANN软件安装指南", DOCS_URL), ("CANN开发指南", DOCS_URL)],
    },
    KeywordRule {
        topic: Topic::Api,
        keywords: &["api", "接口"],
        response: API_REPLY,
        sources: &[("Ascend C API参考", DOCS_URL), ("AscendCL应用开发指南", DOCS_URL)],
    },
    KeywordRule {
        topic: Topic::Precision,
        keywords: &["精度", "调试"],
        response: PRECISION_REPLY,
        sources: &[("精度比对工具使用指南", DOCS_URL), ("CANN开发指南", DOCS_URL)],
    },
    KeywordRule {
        topic: Topic::Performance,
        keywords: &["性能", "优化"],
        response: PERFORMANCE_REPLY,
        sources: &[("性能调优工具使用指南", DOCS_URL), ("Ascend C API参考", DOCS_URL)],
    },
];

impl KeywordRule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }

    fn reply(&self) -> Reply {
        Reply {
            topic: Some(self.topic),
            text: self.response.to_string(),
            sources: to_sources(self.sources),
        }
    }
}

fn to_sources(pairs: &[(&str, &str)]) -> Vec<Source> {
    pairs
        .iter()
        .map(|(title, url)| Source {
            title: title.to_string(),
            url: url.to_string(),
        })
        .collect()
}

/// Pick the canned reply for a question.
pub fn select_response(input: &str) -> Reply {
    let lowered = input.to_lowercase();

    match RULES.iter().find(|rule| rule.matches(&lowered)) {
        Some(rule) => rule.reply(),
        None => fallback_reply(input),
    }
}

fn fallback_reply(input: &str) -> Reply {
    let text = format!(
        "感谢您的提问！我已经收到您关于\"{}\"的问题。

基于CANN知识库搜索，我为您提供以下建议：
- 📚 建议查阅CANN开发者指南相关章节
- 🔍 可以在API文档中搜索相关接口
- 💡 查看社区中的类似问题和解决方案
- 🛠️ 尝试使用CANN提供的调试工具

如果您需要更具体的帮助，请提供更多详细信息，我将为您提供更精准的解答。

**💡 提示：** 您可以尝试询问具体的API使用方法、错误信息解析或性能优化建议。",
        input
    );

    Reply {
        topic: None,
        text,
        sources: to_sources(&[("CANN开发指南", DOCS_URL), ("Ascend C API参考", DOCS_URL)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installation_keywords() {
        for q in ["如何安装CANN", "开发环境怎么搭", "配置问题", "安装 API 接口"] {
            assert_eq!(select_response(q).topic, Some(Topic::Installation), "{}", q);
        }
    }

    #[test]
    fn test_api_is_case_insensitive() {
        assert_eq!(select_response("Ascend C API的基本使用方法").topic, Some(Topic::Api));
        assert_eq!(select_response("what does aPi mean").topic, Some(Topic::Api));
        assert_eq!(select_response("接口说明").topic, Some(Topic::Api));
    }

    #[test]
    fn test_rule_order_breaks_ties() {
        // Contains both precision and performance keywords
        assert_eq!(select_response("调试性能").topic, Some(Topic::Precision));
        assert_eq!(select_response("如何优化算子性能？").topic, Some(Topic::Performance));
    }

    #[test]
    fn test_fallback_echoes_verbatim_input() {
        let q = "Hello World 昇腾 $1 {{name}}";
        let reply = select_response(q);
        assert_eq!(reply.topic, None);
        assert!(reply.text.contains(&format!("\"{}\"", q)));
    }

    #[test]
    fn test_quick_questions_mostly_hit_rules() {
        let matched = QUICK_QUESTIONS
            .iter()
            .filter(|q| select_response(q).topic.is_some())
            .count();
        // The data type question has no rule and falls back
        assert_eq!(matched, QUICK_QUESTIONS.len() - 1);
    }

    #[test]
    fn test_every_topic_has_one_rule_with_sources() {
        for topic in [Topic::Installation, Topic::Api, Topic::Precision, Topic::Performance] {
            let rules: Vec<_> = RULES.iter().filter(|r| r.topic == topic).collect();
            assert_eq!(rules.len(), 1, "{:?}", topic);
            assert!(!rules[0].sources.is_empty());
        }
    }
}
