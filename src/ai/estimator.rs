use std::sync::Arc;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{EstimateError, GenerativeModel, ImagePart};

const MEAL_PROMPT: &str = r#"You are a nutrition assistant. Identify the meal in this photo and estimate its nutritional content for the portion shown.
Reply with a single JSON object and nothing else, using exactly these keys:
{
  "meal_name": string, a short name for the meal,
  "calories": integer, total kilocalories,
  "protein": number, grams of protein,
  "carbs": number, grams of carbohydrate,
  "fat": number, grams of fat,
  "reasoning": string, one or two sentences on how the numbers were estimated
}
Do not wrap the JSON in markdown."#;

/// Reference body used for burn estimates.
const REFERENCE_BODY: &str = "an average adult weighing 75 kg";

/// Duration assumed when the model does not report one.
const DEFAULT_DURATION_MIN: f64 = 30.0;

lazy_static! {
    static ref FENCE_RE: Regex = Regex::new(r"```[A-Za-z]*").unwrap();
}

/// Removes markdown code fences (```` ```json ```` and ```` ``` ````) that
/// models tend to add around JSON replies.
pub(crate) fn strip_code_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").trim().to_string()
}

fn burn_prompt(description: &str) -> String {
    // JSON-quote the user text so quotes or newlines cannot break the prompt.
    let quoted = serde_json::to_string(description).unwrap_or_default();
    format!(
        r#"Estimate the calories burned and the duration of this activity: {quoted}
Assume {REFERENCE_BODY}.
Reply with a single JSON object and nothing else, using exactly these keys:
{{
  "name": string, a short standard name for the activity (for example "Running" or "HIIT"),
  "calories": number, total kilocalories burned,
  "duration": number, minutes; use {DEFAULT_DURATION_MIN} if the description gives no duration,
  "confidence": "high" or "low"
}}
Do not wrap the JSON in markdown."#
    )
}

/// Nutrition estimate for a photographed meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEstimate {
    pub meal_name: String,
    pub calories: i32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub reasoning: String,
}

#[derive(Debug, Deserialize)]
struct MealReply {
    meal_name: String,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    #[serde(default)]
    reasoning: String,
}

impl TryFrom<MealReply> for MealEstimate {
    type Error = EstimateError;

    fn try_from(r: MealReply) -> Result<Self, Self::Error> {
        let name = r.meal_name.trim();
        if name.is_empty() {
            return Err(EstimateError::Malformed("meal_name is empty".into()));
        }
        for (field, v) in [
            ("calories", r.calories),
            ("protein", r.protein),
            ("carbs", r.carbs),
            ("fat", r.fat),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(EstimateError::Malformed(format!("{field} out of range: {v}")));
            }
        }
        if r.calories > f64::from(i32::MAX) {
            return Err(EstimateError::Malformed("calories out of range".into()));
        }
        Ok(MealEstimate {
            meal_name: name.to_string(),
            calories: r.calories.round() as i32,
            protein: r.protein,
            carbs: r.carbs,
            fat: r.fat,
            reasoning: r.reasoning.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Low,
}

/// Burn estimate for an activity description. Always present: a failed
/// estimation yields [`BurnEstimate::unavailable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnEstimate {
    pub name: String,
    pub calories: f64,
    pub duration: f64,
    pub confidence: Confidence,
}

impl BurnEstimate {
    pub fn unavailable() -> Self {
        Self {
            name: "Activity".into(),
            calories: 0.0,
            duration: 0.0,
            confidence: Confidence::Low,
        }
    }

    /// A zero burn means no usable estimate; the client should ask for a
    /// manual figure instead of logging it.
    pub fn needs_manual_entry(&self) -> bool {
        self.calories <= 0.0
    }
}

#[derive(Debug, Deserialize)]
struct BurnReply {
    #[serde(default)]
    name: String,
    calories: f64,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    confidence: Option<Confidence>,
}

impl TryFrom<BurnReply> for BurnEstimate {
    type Error = EstimateError;

    fn try_from(r: BurnReply) -> Result<Self, Self::Error> {
        if !r.calories.is_finite() || r.calories < 0.0 {
            return Err(EstimateError::Malformed(format!(
                "calories out of range: {}",
                r.calories
            )));
        }
        let duration = match r.duration {
            Some(d) if d.is_finite() && d >= 0.0 => d,
            Some(d) => {
                return Err(EstimateError::Malformed(format!("duration out of range: {d}")))
            }
            None => DEFAULT_DURATION_MIN,
        };
        let name = r.name.trim();
        Ok(BurnEstimate {
            name: if name.is_empty() { "Activity" } else { name }.to_string(),
            calories: r.calories,
            duration,
            confidence: r.confidence.unwrap_or_default(),
        })
    }
}

fn parse_reply<T, R>(raw: &str) -> Result<T, EstimateError>
where
    R: serde::de::DeserializeOwned,
    T: TryFrom<R, Error = EstimateError>,
{
    let cleaned = strip_code_fences(raw);
    let reply: R = serde_json::from_str(&cleaned)
        .map_err(|e| EstimateError::Malformed(format!("{e}: {cleaned}")))?;
    T::try_from(reply)
}

/// Turns free text or photos into typed estimates through a generative model.
/// Each call is bounded by `timeout`; dropping the pending call cancels the
/// outbound request.
#[derive(Clone)]
pub struct Estimator {
    model: Arc<dyn GenerativeModel>,
    timeout: Duration,
}

impl Estimator {
    pub fn new(model: Arc<dyn GenerativeModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_configured()
    }

    async fn ask(&self, prompt: &str, image: Option<&ImagePart>) -> Result<String, EstimateError> {
        tokio::time::timeout(self.timeout, self.model.generate(prompt, image))
            .await
            .map_err(|_| EstimateError::Timeout(self.timeout))?
    }

    /// Estimates a meal's nutrition from a photo. Every failure is returned:
    /// a half-parsed estimate must never be saved as a meal.
    pub async fn analyze_image(&self, image: &ImagePart) -> Result<MealEstimate, EstimateError> {
        let raw = self.ask(MEAL_PROMPT, Some(image)).await?;
        let estimate: MealEstimate = parse_reply::<MealEstimate, MealReply>(&raw)?;
        info!(meal = %estimate.meal_name, calories = estimate.calories, "meal image analysed");
        Ok(estimate)
    }

    /// Estimates calories burned for a described activity. Failures degrade to
    /// [`BurnEstimate::unavailable`].
    pub async fn estimate_burn(&self, description: &str) -> BurnEstimate {
        let result = match self.ask(&burn_prompt(description), None).await {
            Ok(raw) => parse_reply::<BurnEstimate, BurnReply>(&raw),
            Err(e) => Err(e),
        };
        match result {
            Ok(estimate) => {
                info!(activity = %estimate.name, calories = estimate.calories, "burn estimated");
                estimate
            }
            Err(e) => {
                warn!(error = %e, "burn estimate unavailable, returning zero estimate");
                BurnEstimate::unavailable()
            }
        }
    }
}

#[cfg(test)]
mod estimator_tests {
    use super::*;
    use crate::ai::fake::ScriptedModel;
    use bytes::Bytes;

    fn estimator(model: ScriptedModel) -> Estimator {
        Estimator::new(Arc::new(model), Duration::from_millis(200))
    }

    fn photo() -> ImagePart {
        ImagePart {
            data: Bytes::from_static(b"\xff\xd8\xff"),
            mime_type: "image/jpeg".into(),
        }
    }

    #[test]
    fn strips_fences_and_whitespace() {
        let raw = "```json\n{\"a\": 1}\n```\n";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {} "), "{}");
    }

    #[test]
    fn burn_prompt_quotes_user_text() {
        let p = burn_prompt("ran \"fast\"\nfor 5k");
        assert!(p.contains(r#""ran \"fast\"\nfor 5k""#));
        assert!(p.contains("75 kg"));
    }

    #[tokio::test]
    async fn analyze_image_parses_fenced_reply() {
        let model = ScriptedModel::reply(
            "```json\n{\"meal_name\":\"Chicken bowl\",\"calories\":612.4,\"protein\":48,\
             \"carbs\":55.5,\"fat\":18,\"reasoning\":\"rice and chicken\"}\n```",
        );
        let est = estimator(model).analyze_image(&photo()).await.unwrap();
        assert_eq!(
            est,
            MealEstimate {
                meal_name: "Chicken bowl".into(),
                calories: 612,
                protein: 48.0,
                carbs: 55.5,
                fat: 18.0,
                reasoning: "rice and chicken".into(),
            }
        );
    }

    #[tokio::test]
    async fn analyze_image_rejects_non_json() {
        let err = estimator(ScriptedModel::reply("not json"))
            .analyze_image(&photo())
            .await
            .unwrap_err();
        assert!(matches!(err, EstimateError::Malformed(_)));
    }

    #[tokio::test]
    async fn analyze_image_rejects_missing_fields() {
        let err = estimator(ScriptedModel::reply(r#"{"meal_name":"Soup","calories":200}"#))
            .analyze_image(&photo())
            .await
            .unwrap_err();
        assert!(matches!(err, EstimateError::Malformed(_)));
    }

    #[tokio::test]
    async fn analyze_image_rejects_negative_numbers() {
        let err = estimator(ScriptedModel::reply(
            r#"{"meal_name":"Soup","calories":200,"protein":-1,"carbs":2,"fat":3}"#,
        ))
        .analyze_image(&photo())
        .await
        .unwrap_err();
        assert!(matches!(err, EstimateError::Malformed(_)));
    }

    #[tokio::test]
    async fn analyze_image_propagates_upstream_failure() {
        let err = estimator(ScriptedModel::upstream_error())
            .analyze_image(&photo())
            .await
            .unwrap_err();
        assert!(matches!(err, EstimateError::Upstream(_)));
    }

    #[tokio::test]
    async fn analyze_image_times_out() {
        let err = estimator(ScriptedModel::hang())
            .analyze_image(&photo())
            .await
            .unwrap_err();
        assert!(matches!(err, EstimateError::Timeout(_)));
    }

    #[tokio::test]
    async fn estimate_burn_defaults_duration_and_confidence() {
        let model = ScriptedModel::reply(r#"{"name":"Cycling","calories":420}"#);
        let est = estimator(model).estimate_burn("bike commute").await;
        assert_eq!(est.name, "Cycling");
        assert_eq!(est.calories, 420.0);
        assert_eq!(est.duration, 30.0);
        assert_eq!(est.confidence, Confidence::Low);
        assert!(!est.needs_manual_entry());
    }

    #[tokio::test]
    async fn estimate_burn_reads_full_reply() {
        let model = ScriptedModel::reply(
            "```json\n{\"name\":\"Running\",\"calories\":510,\"duration\":45,\"confidence\":\"high\"}\n```",
        );
        let est = estimator(model).estimate_burn("ran 8k in 45 minutes").await;
        assert_eq!(est.duration, 45.0);
        assert_eq!(est.confidence, Confidence::High);
    }

    #[tokio::test]
    async fn estimate_burn_fails_soft() {
        for model in [
            ScriptedModel::upstream_error(),
            ScriptedModel::reply("not json"),
            ScriptedModel::reply(r#"{"name":"Run","calories":-20}"#),
            ScriptedModel::hang(),
        ] {
            let est = estimator(model).estimate_burn("something").await;
            assert_eq!(est, BurnEstimate::unavailable());
            assert!(est.needs_manual_entry());
        }
    }

    #[test]
    fn unavailable_serializes_to_sentinel_shape() {
        let value = serde_json::to_value(BurnEstimate::unavailable()).unwrap();
        assert_eq!(value["name"], "Activity");
        assert_eq!(value["calories"], 0.0);
        assert_eq!(value["duration"], 0.0);
        assert_eq!(value["confidence"], "low");
    }
}
