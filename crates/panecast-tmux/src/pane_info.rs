//! Pane listing for one tmux window, and its parser.

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Tab-delimited format string for `tmux list-panes -t <window> -F`.
pub const LIST_PANES_FORMAT: &str = "#{pane_id}\t#{pane_index}\t#{pane_tty}\t#{pane_active}";

/// One pane of a tmux window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TmuxPaneEntry {
    pub pane_id: String,
    pub pane_index: u32,
    pub tty: String,
    pub active: bool,
}

/// Execute `tmux list-panes -t <window>` and return panes by pane index.
pub fn list_window_panes(
    runner: &impl TmuxCommandRunner,
    window_id: &str,
) -> Result<Vec<TmuxPaneEntry>, TmuxError> {
    let output = runner.run(&["list-panes", "-t", window_id, "-F", LIST_PANES_FORMAT])?;
    let mut panes = parse_list_panes_output(&output)?;
    panes.sort_by_key(|p| p.pane_index);
    Ok(panes)
}

/// Parse the raw output of `tmux list-panes -F <FORMAT>`.
pub fn parse_list_panes_output(output: &str) -> Result<Vec<TmuxPaneEntry>, TmuxError> {
    let mut panes = Vec::new();
    for (idx, line) in output.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        panes.push(parse_line(line, idx + 1)?);
    }
    Ok(panes)
}

fn parse_line(line: &str, line_num: usize) -> Result<TmuxPaneEntry, TmuxError> {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < 2 {
        return Err(TmuxError::ParseError {
            line_num,
            detail: format!("expected at least 2 tab-separated fields, got {}", parts.len()),
        });
    }

    let pane_id = parts[0].trim();
    if !pane_id.starts_with('%') {
        return Err(TmuxError::ParseError {
            line_num,
            detail: format!("not a pane id: {pane_id:?}"),
        });
    }
    let pane_index = parts[1].trim().parse::<u32>().map_err(|e| TmuxError::ParseError {
        line_num,
        detail: format!("bad pane index {:?}: {e}", parts[1]),
    })?;

    Ok(TmuxPaneEntry {
        pane_id: pane_id.to_string(),
        pane_index,
        tty: parts.get(2).map(|s| s.trim().to_string()).unwrap_or_default(),
        active: parts.get(3).is_some_and(|s| parse_bool(s)),
    })
}

fn parse_bool(s: &str) -> bool {
    matches!(s.trim(), "1" | "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_line() {
        let pane = parse_line("%3\t0\t/dev/ttys004\t1", 1).expect("should parse");
        assert_eq!(pane.pane_id, "%3");
        assert_eq!(pane.pane_index, 0);
        assert_eq!(pane.tty, "/dev/ttys004");
        assert!(pane.active);
    }

    #[test]
    fn parse_without_tty_and_active() {
        let pane = parse_line("%1\t2", 1).expect("should parse");
        assert_eq!(pane.pane_index, 2);
        assert!(pane.tty.is_empty());
        assert!(!pane.active);
    }

    #[test]
    fn parse_empty_output() {
        assert!(parse_list_panes_output("").expect("should parse").is_empty());
        assert!(parse_list_panes_output("\n  \n").expect("should parse").is_empty());
    }

    #[test]
    fn parse_bad_index_error() {
        let err = parse_line("%1\tx\t/dev/pts/1\t0", 4).expect_err("bad index");
        assert!(matches!(err, TmuxError::ParseError { line_num: 4, .. }));
    }

    #[test]
    fn parse_non_pane_id_error() {
        assert!(parse_line("@1\t0", 1).is_err());
    }

    #[test]
    fn list_sorts_by_pane_index() {
        struct MockRunner;
        impl TmuxCommandRunner for MockRunner {
            fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
                assert_eq!(&args[..3], &["list-panes", "-t", "@2"]);
                Ok("%9\t2\t/dev/pts/9\t0\n%4\t0\t/dev/pts/4\t1\n%7\t1\t/dev/pts/7\t0\n".to_string())
            }
        }
        let panes = list_window_panes(&MockRunner, "@2").expect("should list");
        let ids: Vec<&str> = panes.iter().map(|p| p.pane_id.as_str()).collect();
        assert_eq!(ids, vec!["%4", "%7", "%9"]);
    }

    #[test]
    fn parse_bool_variants() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }
}
