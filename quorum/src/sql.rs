//! Small lexical helpers for generated SQL.

/// Leading keywords of statements that only read.
const READ_KEYWORDS: &[&str] = &["select", "show", "describe", "desc", "explain"];

/// Verbs that can follow a `WITH` clause.
const CTE_VERBS: &[&str] = &["select", "insert", "update", "delete", "replace"];

/// How the executor must treat a statement's transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Never committed
    Read,
    /// Committed only on success
    Mutation,
}

impl StatementKind {
    pub fn classify(sql: &str) -> Self {
        let keyword = match leading_keyword(sql) {
            Some(keyword) if keyword == "with" => cte_verb(sql),
            keyword => keyword,
        };
        match keyword {
            Some(keyword) if READ_KEYWORDS.contains(&keyword.as_str()) => Self::Read,
            _ => Self::Mutation,
        }
    }

    pub fn is_read(self) -> bool {
        self == Self::Read
    }
}

/// First word of the statement, lowercased.
pub fn leading_keyword(sql: &str) -> Option<String> {
    let word: String = sql
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if word.is_empty() {
        None
    } else {
        Some(word.to_ascii_lowercase())
    }
}

/// First statement verb outside parentheses and quotes, i.e. the one a
/// `WITH` clause leads into.
fn cte_verb(sql: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut word = String::new();

    for c in sql.chars().chain(std::iter::once(' ')) {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        if depth == 0 && (c.is_ascii_alphanumeric() || c == '_') {
            word.push(c.to_ascii_lowercase());
            continue;
        }
        if CTE_VERBS.contains(&word.as_str()) {
            return Some(word);
        }
        word.clear();
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// Remove markdown code-fence markup an oracle wrapped around its answer.
pub fn strip_code_fences(raw: &str) -> String {
    raw.trim()
        .replace("```sql", "")
        .replace("```SQL", "")
        .replace("```", "")
        .trim()
        .to_string()
}
