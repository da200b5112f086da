use crate::model::task::Task;

/// Split a query into lowercase whitespace-separated tokens
pub fn tokenize_query(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// A tag view is a non-empty query made only of `#x` tokens
pub fn is_tag_view(tokens: &[String]) -> bool {
    !tokens.is_empty() && tokens.iter().all(|t| t.starts_with('#') && t.len() > 1)
}

/// True if every token matches the task. `#x` matches any tag containing
/// `x`; other tokens match the text case-insensitively. A bare `#` matches
/// every tagged task.
pub fn matches(task: &Task, tokens: &[String]) -> bool {
    let text = task.text.to_lowercase();
    tokens.iter().all(|token| match token.strip_prefix('#') {
        Some(needle) => task.tags.iter().any(|tag| tag.contains(needle)),
        None => text.contains(token.as_str()),
    })
}

/// Tasks matching `query`, paired with their index in `list`. An empty query
/// matches everything.
pub fn filter_tasks<'a>(list: &'a [Task], query: &str) -> Vec<(&'a Task, usize)> {
    let tokens = tokenize_query(query);
    list.iter()
        .enumerate()
        .filter(|(_, task)| matches(task, &tokens))
        .map(|(i, task)| (task, i))
        .collect()
}

/// The momentum lens: tasks currently being pursued
pub fn momentum_tasks(list: &[Task]) -> Vec<(&Task, usize)> {
    list.iter()
        .enumerate()
        .filter(|(_, task)| task.momentum)
        .map(|(i, task)| (task, i))
        .collect()
}
