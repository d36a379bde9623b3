//! Text generation and evaluation

use super::ArgGroup;
use crate::schema::{ElementType, FieldDescriptor};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

choice_enum! {
    /// How the model is sampled
    pub enum TextGenType {
        Unconditional => "unconditional",
        InputFile => "input-file",
        Interactive => "interactive",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextgenArgs {
    pub text_gen_type: Option<TextGenType>,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u64,
    pub maximum_tokens: u64,
    pub sample_input_file: Option<String>,
    pub sample_output_file: Option<String>,
    pub num_samples: u64,
    pub recompute: bool,
    pub eval_results_prefix: String,
    pub eval_tasks: Option<Vec<String>>,
}

impl Default for TextgenArgs {
    fn default() -> Self {
        Self {
            text_gen_type: None,
            temperature: 0.0,
            top_p: 0.0,
            top_k: 0,
            maximum_tokens: 64,
            sample_input_file: None,
            sample_output_file: None,
            num_samples: 0,
            recompute: false,
            eval_results_prefix: String::new(),
            eval_tasks: None,
        }
    }
}

impl TextgenArgs {
    /// File evaluation results are written to:
    /// `{eval_results_prefix}_eval_results_yy-mm-dd-HH-MM.json`
    pub fn eval_results_path<Tz>(&self, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        format!(
            "{}_eval_results_{}.json",
            self.eval_results_prefix,
            now.format("%y-%m-%d-%H-%M")
        )
    }

    /// Sampling is greedy when no temperature, top-k or top-p is set
    pub fn is_greedy(&self) -> bool {
        self.temperature == 0.0 && self.top_k == 0 && self.top_p == 0.0
    }
}

impl ArgGroup for TextgenArgs {
    const NAME: &'static str = "text_generation";

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::choice("text_gen_type", TextGenType::VARIANTS)
                .optional("no text is generated")
                .doc("How to sample the model: unconditional, input-file or interactive."),
            FieldDescriptor::float("temperature")
                .default(0.0)
                .non_negative()
                .doc("Exponential scaling of the output distribution (higher is riskier)."),
            FieldDescriptor::float("top_p")
                .default(0.0)
                .bounded(0.0, 1.0)
                .doc(
                    "Nucleus sampling: choose from the smallest set of tokens whose cumulative \
                     probability exceeds top_p.",
                ),
            FieldDescriptor::integer("top_k")
                .default(0)
                .non_negative()
                .doc("Keep only the top_k most likely tokens; 0 disables."),
            FieldDescriptor::integer("maximum_tokens")
                .default(64)
                .at_least_one()
                .doc("Maximum number of tokens to generate."),
            FieldDescriptor::string("sample_input_file")
                .optional("prompts are not read from a file")
                .doc("Read prompts from this file, one per line."),
            FieldDescriptor::string("sample_output_file")
                .optional("samples are not written to a file")
                .doc("Write generated samples to this file."),
            FieldDescriptor::integer("num_samples")
                .default(0)
                .non_negative()
                .doc("Number of unconditional samples to generate; 0 means interactive sampling."),
            FieldDescriptor::boolean("recompute")
                .default(false)
                .doc(
                    "Recompute all attention during generation instead of caching keys and \
                     values. Should be set for sparse attention models.",
                ),
            FieldDescriptor::string("eval_results_prefix")
                .default("")
                .doc("Prefix of the evaluation results file, {prefix}_eval_results_yy-mm-dd-HH-MM.json."),
            FieldDescriptor::list("eval_tasks", ElementType::String)
                .optional("no evaluation tasks are run")
                .doc("Evaluation harness tasks to run."),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_eval_results_path() {
        let args = TextgenArgs {
            eval_results_prefix: "runs/neox".to_string(),
            ..Default::default()
        };
        let now = Utc.with_ymd_and_hms(2021, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(
            args.eval_results_path(&now),
            "runs/neox_eval_results_21-03-07-09-05.json"
        );
    }

    #[test]
    fn test_text_gen_type_hyphenated() {
        assert_eq!(TextGenType::InputFile.as_str(), "input-file");
        assert_eq!(
            serde_json::to_value(TextGenType::InputFile).unwrap(),
            serde_json::json!("input-file")
        );
    }

    #[test]
    fn test_greedy_by_default() {
        assert!(TextgenArgs::default().is_greedy());
    }
}
