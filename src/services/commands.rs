use crate::{
    error::ValidationError,
    models::{normalize_symbol, Direction},
};

pub const GET_TOKEN_USAGE: &str = "/get_token [token symbol]";
pub const SET_ALERT_USAGE: &str = "/set_alert [token symbol] [price threshold] [above/below]";
pub const REMOVE_ALERT_USAGE: &str = "/remove_alert [alert ID]";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    Register,
    GetQuote { symbol: String },
    SetAlert { symbol: String, threshold: f64, direction: Direction },
    ListAlerts,
    RemoveAlert { id: i64 },
}

impl Command {
    /// Parses one chat message. `Ok(None)` means the text is not a command
    /// at all (no leading `/`) and deserves no reply.
    pub fn parse(text: &str) -> Result<Option<Command>, ValidationError> {
        let mut tokens = text.split_whitespace();

        let Some(first) = tokens.next() else {
            return Ok(None);
        };
        if !first.starts_with('/') {
            return Ok(None);
        }

        // "/set_alert@SomeBot" in group chats
        let verb = first.split('@').next().unwrap_or(first).to_lowercase();
        let args: Vec<&str> = tokens.collect();

        let cmd = match verb.as_str() {
            "/start" => Command::Start,
            "/help" => Command::Help,
            "/register" => Command::Register,
            "/get_token" | "/quote" => {
                let symbol = symbol_arg(&args, 0).ok_or(ValidationError::Usage(GET_TOKEN_USAGE))?;
                Command::GetQuote { symbol }
            }
            "/set_alert" => {
                let (Some(symbol), Some(raw_threshold), Some(raw_direction)) =
                    (symbol_arg(&args, 0), args.get(1), args.get(2))
                else {
                    return Err(ValidationError::Usage(SET_ALERT_USAGE));
                };

                Command::SetAlert {
                    symbol,
                    threshold: parse_threshold(raw_threshold)?,
                    direction: raw_direction
                        .parse::<Direction>()
                        .map_err(|_| ValidationError::InvalidDirection(raw_direction.to_string()))?,
                }
            }
            "/list_alerts" => Command::ListAlerts,
            "/remove_alert" => {
                let raw = args.first().ok_or(ValidationError::Usage(REMOVE_ALERT_USAGE))?;
                // any integer is a well-formed id; the store decides whether it exists
                let id = raw
                    .trim_start_matches('#')
                    .parse::<i64>()
                    .map_err(|_| ValidationError::InvalidAlertId(raw.to_string()))?;
                Command::RemoveAlert { id }
            }
            other => return Err(ValidationError::UnknownCommand(other.to_string())),
        };

        Ok(Some(cmd))
    }
}

fn symbol_arg(args: &[&str], idx: usize) -> Option<String> {
    args.get(idx)
        .map(|s| normalize_symbol(s))
        .filter(|s| !s.is_empty())
}

/// Accepts plain decimals with an optional leading `$`. Rejects negatives,
/// NaN and infinities.
pub fn parse_threshold(raw: &str) -> Result<f64, ValidationError> {
    let v: f64 = raw
        .trim()
        .trim_start_matches('$')
        .parse()
        .map_err(|_| ValidationError::InvalidThreshold(raw.to_string()))?;

    if !v.is_finite() || v < 0.0 {
        return Err(ValidationError::InvalidThreshold(raw.to_string()));
    }

    Ok(v)
}
