//! Recognition prompts for CBC report images.
//!
//! The model reads a photographed or scanned report and answers with the JSON
//! shape that [`crate::parse_recognition_output`] accepts.

use itp_cbc_core::models::Indicator;

/// System prompt for report recognition.
pub const SYSTEM_PROMPT: &str = r#"You are a laboratory assistant that transcribes complete blood count (CBC) reports.

Read every row of the result table and copy it exactly as printed:
- name: The item label as printed (abbreviation, English or Chinese name)
- value: The numeric result only, without arrows or H/L flags
- unit: The unit as printed (10^9/L, g/L, fL, pg, %, etc.)
- reference_range: The printed reference interval, e.g. "125-350"

Also copy the header fields if present:
- patient_name
- hospital
- test_date: The sampling or report date as YYYY-MM-DD

Never guess a value that is not legible. Leave it out instead.

Output JSON with an "items" array containing one object per row."#;

/// User prompt for one report, listing the indicators to look for.
pub fn make_recognition_prompt() -> String {
    let known = Indicator::ALL
        .iter()
        .map(|i| format!("- {} ({})", i.abbreviation(), i.key()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Transcribe the CBC report in the attached image.

The report may contain any of these items:
{}

Return a JSON object with "patient_name", "hospital", "test_date" and an "items" array. Each item should have:
- name: Label as printed
- value: Number
- unit: Unit (null if not printed)
- reference_range: Reference interval (null if not printed)"#,
        known
    )
}

/// Example answer shown to the model before the real request.
pub const FEW_SHOT_EXAMPLE: &str = r#"{"patient_name":"Li Wei","hospital":"Central Hospital","test_date":"2024-03-01","items":[{"name":"WBC","value":5.2,"unit":"10^9/L","reference_range":"3.5-9.5"},{"name":"血小板计数","value":45,"unit":"10^9/L","reference_range":"125-350"},{"name":"HGB","value":128,"unit":"g/L","reference_range":"115-175"}]}"#;

/// Build a complete prompt with system context and an optional example.
pub fn build_full_prompt(include_example: bool) -> String {
    let mut prompt = String::new();

    prompt.push_str("<|system|>\n");
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n<|end|>\n");

    if include_example {
        prompt.push_str("<|user|>\n");
        prompt.push_str(&make_recognition_prompt());
        prompt.push_str("\n<|end|>\n");
        prompt.push_str("<|assistant|>\n");
        prompt.push_str(FEW_SHOT_EXAMPLE);
        prompt.push_str("\n<|end|>\n");
    }

    prompt.push_str("<|user|>\n");
    prompt.push_str(&make_recognition_prompt());
    prompt.push_str("\n<|end|>\n");
    prompt.push_str("<|assistant|>\n");

    prompt
}
