/// Advisory model adapters. The Groq provider speaks the OpenAI-compatible
/// chat-completions API with function calling so replies arrive as a fixed
/// JSON schema; anything that does not parse cleanly is an oracle error and
/// the caller falls back to the rule-based strategy.
use crate::config::EngineConfig;
use pool_core::{
    CaseMatch, Opportunity, PoolMetrics, Proposal, QuoteSnapshot, RiskAssessment, RiskFactors,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use strategy::ports::{OracleError, RiskAssessor, StrategyOracle};
use tracing::debug;

const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

pub struct GroqOracle {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl GroqOracle {
    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.groq_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: GROQ_ENDPOINT.to_string(),
            api_key: config.groq_api_key.clone(),
            model: config.groq_model.clone(),
            temperature: config.groq_temperature,
            max_tokens: config.groq_max_tokens,
        })
    }

    async fn call(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tools: Value,
    ) -> Result<Value, OracleError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "tools": tools,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout
                } else {
                    OracleError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Transport(format!("HTTP {}", status)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))
    }
}

/// Arguments of the `recommend_strategy` tool call.
#[derive(Debug, Deserialize)]
struct RawStrategy {
    selected_opportunities: Vec<i64>,
    position_sizes: Vec<f64>,
    risk_assessment: String,
    reasoning: String,
}

/// Arguments of the `risk_assessment` tool call.
#[derive(Debug, Deserialize)]
struct RawAssessment {
    risk_score: i64,
    recommendation: String,
    liquidity_risk: Option<String>,
    exchange_risk: Option<String>,
    market_risk: Option<String>,
    pool_impact: Option<String>,
}

/// Pull the first tool call with the expected name out of a chat reply
/// and hand back its decoded arguments.
fn tool_arguments(reply: &Value, tool_name: &str) -> Result<Value, OracleError> {
    let call = reply
        .pointer("/choices/0/message/tool_calls/0")
        .ok_or_else(|| OracleError::Malformed("reply carries no tool call".into()))?;

    let name = call.pointer("/function/name").and_then(Value::as_str);
    if name != Some(tool_name) {
        return Err(OracleError::Malformed(format!(
            "expected tool {}, got {:?}",
            tool_name, name
        )));
    }

    let arguments = call
        .pointer("/function/arguments")
        .and_then(Value::as_str)
        .ok_or_else(|| OracleError::Malformed("tool call has no arguments".into()))?;

    serde_json::from_str(arguments).map_err(|e| OracleError::Malformed(e.to_string()))
}

fn parse_strategy_reply(reply: &Value) -> Result<Proposal, OracleError> {
    let raw: RawStrategy = serde_json::from_value(tool_arguments(reply, "recommend_strategy")?)
        .map_err(|e| OracleError::Malformed(e.to_string()))?;

    let mut selected = Vec::with_capacity(raw.selected_opportunities.len());
    for index in raw.selected_opportunities {
        if index < 0 {
            return Err(OracleError::Invalid(format!("negative index {}", index)));
        }
        selected.push(index as usize);
    }

    Ok(Proposal {
        selected,
        sizes_usd: raw.position_sizes,
        risk_label: raw.risk_assessment,
        reasoning: raw.reasoning,
        fallback: false,
    })
}

fn parse_risk_reply(reply: &Value) -> Result<RiskAssessment, OracleError> {
    let raw: RawAssessment = serde_json::from_value(tool_arguments(reply, "risk_assessment")?)
        .map_err(|e| OracleError::Malformed(e.to_string()))?;

    Ok(RiskAssessment {
        score: raw.risk_score.clamp(1, 10) as u8,
        recommendation: raw.recommendation,
        factors: Some(RiskFactors {
            liquidity: raw.liquidity_risk,
            venue: raw.exchange_risk,
            market: raw.market_risk,
            pool_impact: raw.pool_impact,
        }),
    })
}

/// Per-venue bid/ask summary keeps the prompt compact; the full order
/// book never goes to the model.
fn summarize_snapshot(snapshot: &QuoteSnapshot) -> Value {
    let mut summary = serde_json::Map::new();
    for (symbol, venues) in &snapshot.quotes {
        let mut per_venue = serde_json::Map::new();
        for (venue, quote) in venues {
            per_venue.insert(
                venue.clone(),
                json!({
                    "bid": quote.bid,
                    "ask": quote.ask,
                    "spread": if quote.bid > 0.0 {
                        (quote.ask - quote.bid) / quote.bid * 100.0
                    } else {
                        0.0
                    },
                }),
            );
        }
        summary.insert(symbol.clone(), Value::Object(per_venue));
    }
    Value::Object(summary)
}

#[async_trait::async_trait]
impl StrategyOracle for GroqOracle {
    async fn propose(
        &self,
        pool: &PoolMetrics,
        snapshot: &QuoteSnapshot,
        opportunities: &[Opportunity],
        cases: &[CaseMatch],
    ) -> Result<Proposal, OracleError> {
        let system_prompt = "You are a crypto arbitrage trading strategy expert. Analyze the \
            pool state, market data, and arbitrage opportunities, then recommend which \
            opportunities to pursue and how to size each position. Consider pool liquidity \
            and cash reserves, risk exposure, opportunity profitability, and historical \
            performance in similar conditions.";

        let user_prompt = format!(
            "Current pool state:\n{}\n\nMarket data summary:\n{}\n\nArbitrage opportunities \
             (reference by zero-based index):\n{}\n\nSimilar historical cases:\n{}\n\nRecommend \
             a strategy via the recommend_strategy tool.",
            serde_json::to_string_pretty(pool).unwrap_or_default(),
            summarize_snapshot(snapshot),
            serde_json::to_string_pretty(opportunities).unwrap_or_default(),
            serde_json::to_string_pretty(&cases.iter().take(3).collect::<Vec<_>>())
                .unwrap_or_default(),
        );

        let tools = json!([{
            "type": "function",
            "function": {
                "name": "recommend_strategy",
                "description": "Recommend a trading strategy based on the provided data",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "selected_opportunities": {
                            "type": "array",
                            "description": "Zero-based indices of opportunities to pursue",
                            "items": { "type": "integer" }
                        },
                        "position_sizes": {
                            "type": "array",
                            "description": "Position size in USD for each selected opportunity",
                            "items": { "type": "number" }
                        },
                        "risk_assessment": {
                            "type": "string",
                            "description": "Risk label for the strategy"
                        },
                        "reasoning": {
                            "type": "string",
                            "description": "Reasoning behind the strategy"
                        }
                    },
                    "required": ["selected_opportunities", "position_sizes", "risk_assessment", "reasoning"]
                }
            }
        }]);

        let reply = self.call(system_prompt, &user_prompt, tools).await?;
        debug!("Strategy oracle replied");
        parse_strategy_reply(&reply)
    }
}

#[async_trait::async_trait]
impl RiskAssessor for GroqOracle {
    async fn assess(
        &self,
        pool: &PoolMetrics,
        proposal: &Proposal,
        opportunities: &[Opportunity],
    ) -> Result<RiskAssessment, OracleError> {
        let system_prompt = "You are a risk assessment expert for crypto arbitrage trading. \
            Score the proposed strategy from 1 (lowest risk) to 10 (highest risk), weighing \
            liquidity risk, exchange reliability, market volatility, and the impact on pool \
            health.";

        let selected: Vec<&Opportunity> = proposal
            .selected
            .iter()
            .filter_map(|&i| opportunities.get(i))
            .collect();

        let user_prompt = format!(
            "Current pool state:\n{}\n\nProposed strategy:\n{}\n\nSelected opportunities:\n{}\n\n\
             Assess the risk via the risk_assessment tool.",
            serde_json::to_string_pretty(pool).unwrap_or_default(),
            serde_json::to_string_pretty(proposal).unwrap_or_default(),
            serde_json::to_string_pretty(&selected).unwrap_or_default(),
        );

        let tools = json!([{
            "type": "function",
            "function": {
                "name": "risk_assessment",
                "description": "Provide a risk assessment for the trading strategy",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "risk_score": {
                            "type": "integer",
                            "description": "Risk score from 1 (lowest) to 10 (highest)"
                        },
                        "liquidity_risk": { "type": "string" },
                        "exchange_risk": { "type": "string" },
                        "market_risk": { "type": "string" },
                        "pool_impact": { "type": "string" },
                        "recommendation": {
                            "type": "string",
                            "description": "Recommendation based on the assessment"
                        }
                    },
                    "required": ["risk_score", "recommendation"]
                }
            }
        }]);

        let reply = self.call(system_prompt, &user_prompt, tools).await?;
        parse_risk_reply(&reply)
    }
}

/// Configuration-selected stand-in when no advisory model is wired up;
/// every call fails over to the deterministic paths.
pub struct DisabledOracle;

#[async_trait::async_trait]
impl StrategyOracle for DisabledOracle {
    async fn propose(
        &self,
        _pool: &PoolMetrics,
        _snapshot: &QuoteSnapshot,
        _opportunities: &[Opportunity],
        _cases: &[CaseMatch],
    ) -> Result<Proposal, OracleError> {
        Err(OracleError::Disabled)
    }
}

#[async_trait::async_trait]
impl RiskAssessor for DisabledOracle {
    async fn assess(
        &self,
        _pool: &PoolMetrics,
        _proposal: &Proposal,
        _opportunities: &[Opportunity],
    ) -> Result<RiskAssessment, OracleError> {
        Err(OracleError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy_reply(arguments: &str) -> Value {
        json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "function": {
                            "name": "recommend_strategy",
                            "arguments": arguments,
                        }
                    }]
                }
            }]
        })
    }

    #[test]
    fn test_parse_well_formed_strategy_reply() {
        let reply = strategy_reply(
            r#"{"selected_opportunities":[0,2],"position_sizes":[1500.0,500.0],"risk_assessment":"MEDIUM","reasoning":"tight spreads"}"#,
        );
        let proposal = parse_strategy_reply(&reply).unwrap();
        assert_eq!(proposal.selected, vec![0, 2]);
        assert_eq!(proposal.sizes_usd, vec![1_500.0, 500.0]);
        assert_eq!(proposal.risk_label, "MEDIUM");
        assert!(!proposal.fallback);
    }

    #[test]
    fn test_parse_rejects_invalid_json_arguments() {
        let reply = strategy_reply("this is not json");
        assert!(matches!(
            parse_strategy_reply(&reply),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_negative_index() {
        let reply = strategy_reply(
            r#"{"selected_opportunities":[-1],"position_sizes":[100.0],"risk_assessment":"LOW","reasoning":""}"#,
        );
        assert!(matches!(
            parse_strategy_reply(&reply),
            Err(OracleError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_tool_call() {
        let reply = json!({"choices": [{"message": {"content": "no tools here"}}]});
        assert!(matches!(
            parse_strategy_reply(&reply),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_risk_reply_clamps_score() {
        let reply = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "function": {
                            "name": "risk_assessment",
                            "arguments": r#"{"risk_score": 14, "recommendation": "do not trade", "market_risk": "extreme"}"#,
                        }
                    }]
                }
            }]
        });
        let assessment = parse_risk_reply(&reply).unwrap();
        assert_eq!(assessment.score, 10);
        assert_eq!(assessment.recommendation, "do not trade");
        assert_eq!(assessment.factors.unwrap().market.as_deref(), Some("extreme"));
    }
}
