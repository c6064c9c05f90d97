use cann_core::{
    render, select_response, ChatLog, ChatMessage, CoreError, DataType, OperatorCategory,
    OperatorSpec, RecentQuestions, TemplateKind, Topic,
};

fn foo(data_type: DataType) -> OperatorSpec {
    OperatorSpec {
        name: "Foo".to_string(),
        category: OperatorCategory::Custom,
        description: "adds things".to_string(),
        input_shape: "[8, 16]".to_string(),
        output_shape: "[8, 16]".to_string(),
        data_type,
    }
}

#[test]
fn installation_keywords_always_win() {
    let questions = [
        "安装",
        "环境变量怎么设置",
        "配置 API 接口",
        "调试环境下性能优化",
        "如何配置CANN开发环境？",
        "CANN安装过程中常见错误解决",
    ];
    for q in questions {
        let reply = select_response(q);
        assert_eq!(reply.topic, Some(Topic::Installation), "{}", q);
        assert!(reply.text.contains("安装步骤"));
    }
}

#[test]
fn unmatched_input_is_echoed_verbatim() {
    for q in ["hello", "昇腾硬件支持哪些数据类型？", "<b>\"quoted\"</b>", "  spaced  "] {
        let reply = select_response(q);
        assert_eq!(reply.topic, None);
        assert!(reply.text.contains(q), "{}", q);
    }
}

#[test]
fn selection_is_deterministic() {
    let a = select_response("算子精度问题如何排查？");
    let b = select_response("算子精度问题如何排查？");
    assert_eq!(a, b);
    assert_eq!(a.topic, Some(Topic::Precision));
}

#[test]
fn recent_questions_never_exceed_five() {
    let mut recent = RecentQuestions::new();
    for i in 0..20 {
        recent.push(format!("question {}", i));
        assert!(recent.len() <= 5);
    }
    let items: Vec<&str> = recent.iter().collect();
    assert_eq!(items, vec!["question 19", "question 18", "question 17", "question 16", "question 15"]);
}

#[test]
fn empty_name_blocks_generation() {
    let mut spec = foo(DataType::Float16);
    let previous = render(TemplateKind::AclOperator, &spec).unwrap();

    spec.name.clear();
    let mut current = Some(previous.clone());
    match render(TemplateKind::AclOperator, &spec) {
        Ok(code) => current = Some(code),
        Err(err) => assert!(matches!(err, CoreError::MissingField(_))),
    }
    assert_eq!(current, Some(previous));
}

#[test]
fn foo_float16_contains_class_and_acl_type() {
    let code = render(TemplateKind::AclOperator, &foo(DataType::Float16)).unwrap();
    assert!(code.source.contains("class Foo"));
    assert!(code.source.contains("ACL_FLOAT16"));

    let kernel = render(TemplateKind::AscendKernel, &foo(DataType::Float16)).unwrap();
    assert!(kernel.source.contains("class FooKernel"));
    assert!(kernel.source.contains("GlobalTensor<half>"));
}

#[test]
fn special_characters_do_not_corrupt_output() {
    let mut spec = foo(DataType::Int32);
    spec.description = "uses $1 and ${name} and {{class_name}} */ evil();\n#define X".to_string();

    for kind in [TemplateKind::AclOperator, TemplateKind::AscendKernel] {
        let code = render(kind, &spec).unwrap();
        assert!(code.source.contains("$1 and ${name} and {{class_name}} * / evil(); #define X"));
        assert_eq!(code.source.matches("{{").count(), 1);
        assert!(!code.source.contains("\n#define X"));
    }
}

#[test]
fn shapes_cannot_open_or_close_comments() {
    for bad in ["[a*/b]", "[H/*x]", "[N//c]", "[1 2]"] {
        let mut spec = foo(DataType::Float16);
        spec.input_shape = bad.to_string();
        for kind in [TemplateKind::AclOperator, TemplateKind::AscendKernel] {
            let err = render(kind, &spec).unwrap_err();
            assert!(err.is_validation(), "{}", bad);
        }
    }

    let mut spec = foo(DataType::Float16);
    spec.input_shape = "[N, C * 2, H/2]".to_string();
    let code = render(TemplateKind::AclOperator, &spec).unwrap();
    assert!(code.source.contains("{N, C * 2, H/2}"));
}

#[test]
fn rendering_is_repeatable() {
    let spec = foo(DataType::Uint8);
    let a = render(TemplateKind::AclOperator, &spec).unwrap();
    let b = render(TemplateKind::AclOperator, &spec).unwrap();
    assert_eq!(a, b);
    assert!(a.source.contains("ACL_UINT8"));
}

#[test]
fn chat_log_is_append_only_and_exportable() {
    let mut log = ChatLog::new();
    for q in ["a", "b", "c"] {
        log.push(ChatMessage::user(q));
        log.push(ChatMessage::assistant(select_response(q)));
    }
    assert_eq!(log.len(), 6);

    let value: serde_json::Value = serde_json::from_str(&log.export_json().unwrap()).unwrap();
    let roles: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["user", "assistant", "user", "assistant", "user", "assistant"]);
}
