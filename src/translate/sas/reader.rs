use super::{
    PrePost, SasAxiom, SasFact, SasGoal, SasInit, SasMutexGroup, SasOperator, SasTask,
    SasVariables, SAS_FILE_VERSION,
};
use crate::translate::{Result, TranslateError};
use std::fs;
use std::iter::Enumerate;
use std::path::Path;
use std::str::{FromStr, Lines};

impl SasTask {
    /// Reads a task written by [`SasTask::write_sas`].
    pub fn from_sas_str(text: &str) -> Result<Self> {
        SasReader::new(text).task()
    }

    pub fn from_sas_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|source| TranslateError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::from_sas_str(&text)
    }
}

#[derive(Debug)]
struct SasReader<'a> {
    lines: Enumerate<Lines<'a>>,
    line: usize,
}

impl<'a> SasReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            line: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> TranslateError {
        TranslateError::SasFormat {
            line: self.line,
            message: message.into(),
        }
    }

    fn next_line(&mut self) -> Result<&'a str> {
        match self.lines.next() {
            Some((index, line)) => {
                self.line = index + 1;
                Ok(line.trim_end())
            }
            None => Err(self.error("unexpected end of file")),
        }
    }

    fn expect(&mut self, keyword: &str) -> Result<()> {
        let line = self.next_line()?;
        if line == keyword {
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}, found {:?}", keyword, line)))
        }
    }

    fn parse<T: FromStr>(&mut self) -> Result<T> {
        let line = self.next_line()?;
        line.trim()
            .parse()
            .map_err(|_| self.error(format!("expected a number, found {:?}", line)))
    }

    fn numbers(&mut self) -> Result<Vec<i64>> {
        let line = self.next_line()?;
        line.split_whitespace()
            .map(|token| {
                token
                    .parse()
                    .map_err(|_| self.error(format!("expected a number, found {:?}", token)))
            })
            .collect()
    }

    fn index(&self, number: i64) -> Result<usize> {
        usize::try_from(number).map_err(|_| self.error(format!("negative index {}", number)))
    }

    fn fact(&mut self) -> Result<SasFact> {
        match self.numbers()?.as_slice() {
            [var, value] => Ok((self.index(*var)?, self.index(*value)?)),
            numbers => Err(self.error(format!("expected a fact, found {:?}", numbers))),
        }
    }

    fn facts(&mut self) -> Result<Vec<SasFact>> {
        let count: usize = self.parse()?;
        (0..count).map(|_| self.fact()).collect()
    }

    fn task(mut self) -> Result<SasTask> {
        self.expect("begin_version")?;
        let version: u32 = self.parse()?;
        if version != SAS_FILE_VERSION {
            return Err(self.error(format!("unsupported version {}", version)));
        }
        self.expect("end_version")?;
        self.expect("begin_metric")?;
        let metric = match self.parse::<u8>()? {
            0 => false,
            1 => true,
            other => return Err(self.error(format!("invalid metric {}", other))),
        };
        self.expect("end_metric")?;
        let variables = self.variables()?;

        let mutex_count: usize = self.parse()?;
        let mut mutexes = Vec::with_capacity(mutex_count);
        for _ in 0..mutex_count {
            self.expect("begin_mutex_group")?;
            mutexes.push(SasMutexGroup::new(self.facts()?));
            self.expect("end_mutex_group")?;
        }

        self.expect("begin_state")?;
        let values = (0..variables.len())
            .map(|_| self.parse())
            .collect::<Result<Vec<usize>>>()?;
        self.expect("end_state")?;
        self.expect("begin_goal")?;
        let goal = SasGoal::new(self.facts()?);
        self.expect("end_goal")?;

        let operator_count: usize = self.parse()?;
        let operators = (0..operator_count)
            .map(|_| self.operator())
            .collect::<Result<Vec<_>>>()?;
        let axiom_count: usize = self.parse()?;
        let axioms = (0..axiom_count)
            .map(|_| self.axiom())
            .collect::<Result<Vec<_>>>()?;

        Ok(SasTask {
            variables,
            mutexes,
            init: SasInit { values },
            goal,
            operators,
            axioms,
            metric,
        })
    }

    fn variables(&mut self) -> Result<SasVariables> {
        let count: usize = self.parse()?;
        let mut ranges = Vec::with_capacity(count);
        let mut axiom_layers = Vec::with_capacity(count);
        let mut value_names = Vec::with_capacity(count);
        for var in 0..count {
            self.expect("begin_variable")?;
            self.expect(&format!("var{}", var))?;
            axiom_layers.push(self.parse()?);
            let range: usize = self.parse()?;
            let names = (0..range)
                .map(|_| self.next_line().map(str::to_string))
                .collect::<Result<Vec<_>>>()?;
            ranges.push(range);
            value_names.push(names);
            self.expect("end_variable")?;
        }
        Ok(SasVariables::new(ranges, axiom_layers, value_names))
    }

    fn operator(&mut self) -> Result<SasOperator> {
        self.expect("begin_operator")?;
        let name = self.next_line()?.to_string();
        let prevail = self.facts()?;
        let effect_count: usize = self.parse()?;
        let mut pre_post = Vec::with_capacity(effect_count);
        for _ in 0..effect_count {
            let numbers = self.numbers()?;
            let Some((&condition_count, rest)) = numbers.split_first() else {
                return Err(self.error("empty effect"));
            };
            let condition_count = self.index(condition_count)?;
            if rest.len() != 2 * condition_count + 3 {
                return Err(self.error(format!("malformed effect {:?}", numbers)));
            }
            let (condition, effect) = rest.split_at(2 * condition_count);
            let condition = condition
                .chunks(2)
                .map(|pair| Ok((self.index(pair[0])?, self.index(pair[1])?)))
                .collect::<Result<Vec<_>>>()?;
            pre_post.push(PrePost {
                var: self.index(effect[0])?,
                pre: match effect[1] {
                    -1 => None,
                    pre => Some(self.index(pre)?),
                },
                post: self.index(effect[2])?,
                condition,
            });
        }
        let cost: i64 = self.parse()?;
        self.expect("end_operator")?;
        Ok(SasOperator::new(name, prevail, pre_post, cost))
    }

    fn axiom(&mut self) -> Result<SasAxiom> {
        self.expect("begin_rule")?;
        let condition = self.facts()?;
        let effect = match self.numbers()?.as_slice() {
            &[var, old, new] if (new == 0 || new == 1) && old == 1 - new => {
                (self.index(var)?, self.index(new)?)
            }
            numbers => return Err(self.error(format!("malformed axiom effect {:?}", numbers))),
        };
        self.expect("end_rule")?;
        Ok(SasAxiom::new(condition, effect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_TASK: &str = "\
begin_version
3
end_version
begin_metric
0
end_metric
2
begin_variable
var0
-1
3
Atom at(b, r1)
Atom at(b, r2)
<none of those>
end_variable
begin_variable
var1
0
2
Atom goal()
NegatedAtom goal()
end_variable
1
begin_mutex_group
2
0 0
0 1
end_mutex_group
begin_state
0
1
end_state
begin_goal
1
1 0
end_goal
1
begin_operator
move b r1 r2
0
1
0 0 0 1
1
end_operator
1
begin_rule
1
0 1
1 1 0
end_rule
";

    #[test]
    fn reads_what_it_writes() {
        let task = SasTask::from_sas_str(SMALL_TASK).unwrap();
        assert_eq!(task.variables.ranges, vec![3, 2]);
        assert_eq!(task.variables.value_names[0][1], "Atom at(b, r2)");
        assert_eq!(task.operators[0].name, "move b r1 r2");
        assert_eq!(task.operators[0].pre_post[0].pre, Some(0));
        assert_eq!(task.axioms[0].effect, (1, 0));
        assert!(!task.metric);
        assert_eq!(task.to_sas_string().unwrap(), SMALL_TASK);
    }

    #[test]
    fn reports_the_failing_line() {
        let text = SMALL_TASK.replace("begin_state", "begin_stat");
        match SasTask::from_sas_str(&text) {
            Err(TranslateError::SasFormat { line, .. }) => assert_eq!(line, 29),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn truncated_files_are_rejected() {
        let text = &SMALL_TASK[..SMALL_TASK.len() / 2];
        assert!(matches!(
            SasTask::from_sas_str(text),
            Err(TranslateError::SasFormat { .. })
        ));
    }

    #[test]
    fn reads_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.sas");
        fs::write(&path, SMALL_TASK).unwrap();
        let task = SasTask::from_sas_path(&path).unwrap();
        assert_eq!(task.goal.pairs, vec![(1, 0)]);
    }
}
