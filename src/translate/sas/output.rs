use super::{SasAxiom, SasFact, SasGoal, SasInit, SasMutexGroup, SasOperator, SasTask, SasVariables, SAS_FILE_VERSION};
use crate::translate::{Result, TranslateError};
use std::fmt::{self, Write};
use std::fs;
use std::path::Path;

impl SasTask {
    /// Writes the task in the line-oriented SAS format.
    pub fn write_sas<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "begin_version")?;
        writeln!(out, "{}", SAS_FILE_VERSION)?;
        writeln!(out, "end_version")?;
        writeln!(out, "begin_metric")?;
        writeln!(out, "{}", u8::from(self.metric))?;
        writeln!(out, "end_metric")?;
        self.variables.write_sas(out)?;
        writeln!(out, "{}", self.mutexes.len())?;
        for mutex in &self.mutexes {
            mutex.write_sas(out)?;
        }
        self.init.write_sas(out)?;
        self.goal.write_sas(out)?;
        writeln!(out, "{}", self.operators.len())?;
        for operator in &self.operators {
            operator.write_sas(out)?;
        }
        writeln!(out, "{}", self.axioms.len())?;
        for axiom in &self.axioms {
            axiom.write_sas(out)?;
        }
        Ok(())
    }

    pub fn to_sas_string(&self) -> Result<String> {
        let mut text = String::new();
        self.write_sas(&mut text)?;
        Ok(text)
    }

    pub fn write_sas_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = self.to_sas_string()?;
        fs::write(path.as_ref(), text).map_err(|source| TranslateError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

fn write_facts<W: Write>(out: &mut W, facts: &[SasFact]) -> fmt::Result {
    for (var, value) in facts {
        writeln!(out, "{} {}", var, value)?;
    }
    Ok(())
}

impl SasVariables {
    fn write_sas<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "{}", self.ranges.len())?;
        for (var, ((range, axiom_layer), values)) in self
            .ranges
            .iter()
            .zip(&self.axiom_layers)
            .zip(&self.value_names)
            .enumerate()
        {
            writeln!(out, "begin_variable")?;
            writeln!(out, "var{}", var)?;
            writeln!(out, "{}", axiom_layer)?;
            writeln!(out, "{}", range)?;
            for value in values {
                writeln!(out, "{}", value)?;
            }
            writeln!(out, "end_variable")?;
        }
        Ok(())
    }
}

impl SasMutexGroup {
    fn write_sas<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "begin_mutex_group")?;
        writeln!(out, "{}", self.facts.len())?;
        write_facts(out, &self.facts)?;
        writeln!(out, "end_mutex_group")
    }
}

impl SasInit {
    fn write_sas<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "begin_state")?;
        for value in &self.values {
            writeln!(out, "{}", value)?;
        }
        writeln!(out, "end_state")
    }
}

impl SasGoal {
    fn write_sas<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "begin_goal")?;
        writeln!(out, "{}", self.pairs.len())?;
        write_facts(out, &self.pairs)?;
        writeln!(out, "end_goal")
    }
}

impl SasOperator {
    fn write_sas<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "begin_operator")?;
        writeln!(out, "{}", self.name)?;
        writeln!(out, "{}", self.prevail.len())?;
        write_facts(out, &self.prevail)?;
        writeln!(out, "{}", self.pre_post.len())?;
        for effect in &self.pre_post {
            write!(out, "{}", effect.condition.len())?;
            for (var, value) in &effect.condition {
                write!(out, " {} {}", var, value)?;
            }
            match effect.pre {
                Some(pre) => writeln!(out, " {} {} {}", effect.var, pre, effect.post)?,
                None => writeln!(out, " {} -1 {}", effect.var, effect.post)?,
            }
        }
        writeln!(out, "{}", self.cost)?;
        writeln!(out, "end_operator")
    }
}

impl SasAxiom {
    fn write_sas<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "begin_rule")?;
        writeln!(out, "{}", self.condition.len())?;
        write_facts(out, &self.condition)?;
        let (var, value) = self.effect;
        writeln!(out, "{} {} {}", var, 1 - value, value)?;
        writeln!(out, "end_rule")
    }
}

#[cfg(test)]
mod tests {
    use super::super::PrePost;
    use super::*;

    fn small_task() -> SasTask {
        SasTask {
            variables: SasVariables::new(
                vec![2, 2],
                vec![-1, 0],
                vec![
                    vec!["Atom p()".to_string(), "<none of those>".to_string()],
                    vec!["Atom d()".to_string(), "NegatedAtom d()".to_string()],
                ],
            ),
            mutexes: vec![],
            init: SasInit { values: vec![1, 1] },
            goal: SasGoal::new(vec![(1, 0)]),
            operators: vec![SasOperator::new(
                "set-p".to_string(),
                vec![],
                vec![PrePost {
                    var: 0,
                    pre: None,
                    post: 0,
                    condition: vec![(1, 1)],
                }],
                3,
            )],
            axioms: vec![SasAxiom::new(vec![(0, 0)], (1, 0))],
            metric: true,
        }
    }

    #[test]
    fn writes_the_sas_format() {
        let expected = "\
begin_version
3
end_version
begin_metric
1
end_metric
2
begin_variable
var0
-1
2
Atom p()
<none of those>
end_variable
begin_variable
var1
0
2
Atom d()
NegatedAtom d()
end_variable
0
begin_state
1
1
end_state
begin_goal
1
1 0
end_goal
1
begin_operator
set-p
0
1
1 1 1 0 -1 0
3
end_operator
1
begin_rule
1
0 0
1 1 0
end_rule
";
        assert_eq!(small_task().to_sas_string().unwrap(), expected);
    }

    #[test]
    fn writes_to_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.sas");
        small_task().write_sas_file(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("begin_version\n3\nend_version\n"));
    }
}
