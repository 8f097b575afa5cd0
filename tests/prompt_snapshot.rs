use bookmark_maker::phrase::{DEFAULT_MAX_CHARS, render_quote_prompt, render_system_prompt};

fn answers() -> Vec<String> {
    ["조금 피곤해요", "가족", "아니요", "취업 준비", "마음의 여유"]
        .iter()
        .map(|value| value.to_string())
        .collect()
}

#[test]
fn quote_prompt_snapshot() {
    let prompt = render_quote_prompt(&answers(), DEFAULT_MAX_CHARS).unwrap();
    insta::assert_snapshot!(prompt);
}

#[test]
fn system_prompt_snapshot() {
    let prompt = render_system_prompt().unwrap();
    insta::assert_snapshot!(prompt);
}
