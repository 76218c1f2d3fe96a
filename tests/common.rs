#![allow(dead_code)]

/// Builds trace text one record at a time.
///
/// Conclusion keys equal goal ids so every goal gets a distinct snapshot.
pub struct TraceBuilder {
    lines: Vec<String>,
    call: i64,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            call: 0,
        }
    }

    pub fn lemma(mut self, name: &str) -> Self {
        self.lines.push(format!("bg(pf) {{!}} 0 {{!}} {name}"));
        self
    }

    fn record(&mut self, mode: &str, tactic: &str) {
        self.call += 1;
        self.lines.push(format!(
            "bg(ts) {{!}} {} {{!}} {mode} {{!}} {tactic} {{!}} Name {{!}} (t.v,1,1)",
            self.call
        ));
    }

    fn state(&mut self, tactic: &str, ngs: usize, goal: i64) {
        self.lines.push(format!("{ngs} {{!}} {tactic} {{!}} {goal}"));
        self.lines.push(format!("H {{!}} {goal}"));
        self.lines.push("en(ts)".to_string());
    }

    pub fn before(mut self, tactic: &str, ngs: usize, goal: i64) -> Self {
        self.record("bf", tactic);
        self.state(tactic, ngs, goal);
        self
    }

    /// An after-snapshot; `ngs` 0 writes the solved form.
    pub fn after(mut self, tactic: &str, ngs: usize, goal: i64) -> Self {
        self.record("af", tactic);
        if ngs == 0 {
            self.lines.push("ngs=0".to_string());
            self.lines.push("en(ts)".to_string());
        } else {
            self.state(tactic, ngs, goal);
        }
        self
    }

    pub fn dead(mut self, tactic: &str, ngs: usize) -> Self {
        self.record("dead", tactic);
        self.state(tactic, ngs, -2);
        self
    }

    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn end(mut self) -> Self {
        for line in ["Typs", "H : 1", "Bods", "Constrs", "1 : Var n", "PrTyps", "PrBods", "PrGls"] {
            self.lines.push(line.to_string());
        }
        self.lines.push("en(pf)".to_string());
        self
    }

    /// Physical line number the next pushed line will get.
    pub fn next_line(&self) -> usize {
        self.lines.len() + 1
    }

    pub fn build(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

impl Default for TraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
