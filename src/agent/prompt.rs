use crate::platform::types::Issue;

pub fn prompt_for_issue(issue: &Issue) -> String {
    let labels = if issue.labels.is_empty() {
        "None".to_string()
    } else {
        issue.labels.join(", ")
    };

    format!(
        r#"# GitHub Issue #{number}: {title}

## Issue Description
{body}

## Labels
{labels}

## Instructions
Please analyze this GitHub issue and implement a solution. Make sure to:

1. Understand the problem described in the issue
2. Implement the necessary code changes
3. Add appropriate tests if needed
4. Follow the existing code style and patterns in the repository
5. Keep changes minimal and focused on the issue

When you're done implementing, please provide a summary of the changes made."#,
        number = issue.number,
        title = issue.title,
        body = issue.body,
    )
}
