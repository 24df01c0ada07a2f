//! Placeholder substitution for node text.

use story_rules::{clock, EngineConfig, PlayerState};

/// Replace `{hp}`, `{coins}`, `{karma}`, `{time}`, `{weather}` and `{tick}`
/// with values from `state`. Unknown or unterminated placeholders are left
/// as written.
pub fn render(text: &str, state: &PlayerState, config: &EngineConfig) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match (after.find('}'), after.find('{')) {
            (Some(close), reopen) if reopen.map_or(true, |r| close < r) => {
                let name = &after[..close];
                match lookup(name, state, config) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            (Some(_), Some(reopen)) => {
                // A nested `{` starts the real placeholder.
                out.push('{');
                out.push_str(&after[..reopen]);
                rest = &after[reopen..];
            }
            _ => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn lookup(name: &str, state: &PlayerState, config: &EngineConfig) -> Option<String> {
    let value = match name {
        "hp" => state.hp.to_string(),
        "coins" => state.coins.to_string(),
        "karma" => state.karma.to_string(),
        "time" => state.time.to_string(),
        "tick" => state.tick.to_string(),
        "weather" => {
            clock::weather(&state.seed, state.tick, config.effective_cycle_length()).to_string()
        }
        _ => return None,
    };
    Some(value)
}
