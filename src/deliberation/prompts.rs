//! Prompt 模板：system / decision / consider / commit
//!
//! 内置默认模板；`<prompts_dir>/<name>.txt` 存在时覆盖。占位符：
//! {position} {side_to_move} {game_memory} {considered_moves} {decision_reasoning} {error_hint}

use std::path::Path;

use crate::deliberation::capabilities::DeliberationInput;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a grandmaster chess player playing a chess game.
You are playing for you and your family's lives so it's important to play the best moves possible with the most robust reasoning.";

pub const DEFAULT_DECISION_PROMPT: &str = "You are deciding which move to play.
<current_position>
{position}
</current_position>

Here is each move you made previously in this game and its reasoning:
<previous_moves>
{game_memory}
</previous_moves>

These are your existing thoughts on the position and which move to play:
<considered_moves>
{considered_moves}
</considered_moves>

{side_to_move} to play.

Decide whether you want to consider a new move (action \"consider_new\") or if you're ready to decide on a move (action \"commit\").
Consider a new move if you haven't already considered at least two moves.";

pub const DEFAULT_CONSIDER_PROMPT: &str = "Given the position, return the best, valid next move in standard algebraic notation that you haven't already considered.
Example of a correct response: 'e5'
Examples of incorrect responses:
- '2. e5'
- 'e5 is the best move to play in this position.'

Position: {position}

Here is each move you made previously in this game and its reasoning:
{game_memory}

Here are other moves you already considered and their reasoning. DO NOT CHOOSE FROM THESE MOVES:
{considered_moves}

{side_to_move} to play.

Do not add move-number prefixes like '2.' or '2... ' to your move.";

pub const DEFAULT_COMMIT_PROMPT: &str = "Given the position, choose the best, valid next move in standard algebraic notation.
Example of a correct response: 'e5'
Examples of incorrect responses:
- '2. e5'
- 'e5 is the best move to play in this position.'

Position: {position}

Here is each move you made previously in this game and its reasoning:
{game_memory}

Here are all of the moves you considered this turn. If any were considered, ONLY CHOOSE FROM THESE MOVES:
{considered_moves}

Why you decided to commit now:
{decision_reasoning}

{side_to_move} to play.
{error_hint}
Do not add move-number prefixes like '2.' or '2... ' to your move.";

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub system: String,
    pub decision: String,
    pub consider: String,
    pub commit: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            decision: DEFAULT_DECISION_PROMPT.to_string(),
            consider: DEFAULT_CONSIDER_PROMPT.to_string(),
            commit: DEFAULT_COMMIT_PROMPT.to_string(),
        }
    }
}

fn read_override(dir: &Path, name: &str) -> Option<String> {
    [dir.join(format!("{name}.txt")), Path::new("..").join(dir).join(format!("{name}.txt"))]
        .into_iter()
        .find_map(|p| std::fs::read_to_string(p).ok())
        .filter(|s| !s.trim().is_empty())
}

impl PromptTemplates {
    /// 从目录加载覆盖模板，缺失的使用内置默认
    pub fn load(dir: &Path) -> Self {
        let defaults = Self::default();
        Self {
            system: read_override(dir, "system").unwrap_or(defaults.system),
            decision: read_override(dir, "decision").unwrap_or(defaults.decision),
            consider: read_override(dir, "consider").unwrap_or(defaults.consider),
            commit: read_override(dir, "commit").unwrap_or(defaults.commit),
        }
    }

    pub fn render_decision(&self, input: &DeliberationInput<'_>) -> String {
        fill(&self.decision, input)
    }

    pub fn render_consider(&self, input: &DeliberationInput<'_>) -> String {
        fill(&self.consider, input)
    }

    pub fn render_commit(&self, input: &DeliberationInput<'_>) -> String {
        fill(&self.commit, input)
    }
}

fn lookup<'a>(name: &str, input: &'a DeliberationInput<'_>, error_hint: &'a str) -> Option<&'a str> {
    match name {
        "position" => Some(input.context.position.as_str()),
        "side_to_move" => Some(input.context.side_to_move.as_str()),
        "game_memory" => Some(input.game_memory.as_str()),
        "considered_moves" => Some(input.considered_moves.as_str()),
        "decision_reasoning" => Some(input.decision_reasoning.unwrap_or("")),
        "error_hint" => Some(error_hint),
        _ => None,
    }
}

/// 单趟从左到右替换：已插入的记忆 / 理由文本不会再被当作模板扫描
fn fill(template: &str, input: &DeliberationInput<'_>) -> String {
    let error_hint = input
        .error_hint
        .map(|e| format!("\nMake sure to avoid this error: {}.\n", e))
        .unwrap_or_default();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let resolved = after
            .find('}')
            .and_then(|close| lookup(&after[..close], input, &error_hint).map(|v| (close, v)));
        match resolved {
            Some((close, v)) => {
                out.push_str(v);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
