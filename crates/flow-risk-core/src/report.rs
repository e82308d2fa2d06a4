use prettytable::{format, row, Table};

use crate::analysis::RiskRecord;

const TABLE_WRAP_WIDTH: usize = 40;

/// Markdown report: a heading naming the file and one table row per risk.
pub fn render_markdown(file_name: &str, risks: &[RiskRecord]) -> String {
    let mut out = format!("# Flow XML Risk Analysis for {file_name}\n\n");
    out.push_str("| Risk | Description | Recommendation |\n");
    out.push_str("|------|-------------|----------------|\n");
    for risk in risks {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            escape_cell(&risk.risk),
            escape_cell(&risk.description),
            escape_cell(&risk.recommendation)
        ));
    }
    out
}

/// Sentence reported in place of a report when nothing was found.
pub fn no_risks_message(file_name: &str) -> String {
    format!("No risks found in {file_name}")
}

/// Console table with wrapped cells.
pub fn render_table(risks: &[RiskRecord]) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row!["Risk", "Description", "Recommendation"]);
    for risk in risks {
        table.add_row(row![
            wrap(&risk.risk, TABLE_WRAP_WIDTH),
            wrap(&risk.description, TABLE_WRAP_WIDTH),
            wrap(&risk.recommendation, TABLE_WRAP_WIDTH)
        ]);
    }
    table.to_string()
}

fn escape_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}

fn wrap(text: &str, width: usize) -> String {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if line.is_empty() { 0 } else { 1 } + word.chars().count();
            if !line.is_empty() && line.chars().count() + needed > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines.join("\n")
}
