//! CPLEX LP writer.

use crate::model::{Comparison, Constraint, LinearExpr, Model, Sense, VarKind};
use std::collections::HashSet;
use std::io::{self, Write};

const CONSTANT_ROW_TOL: f64 = 1e-9;

/// Write `model` in CPLEX LP format.
///
/// Registered lazy cuts go to the `Lazy Constraints` section so a solver
/// reading the file can add them on demand. Names are rewritten to the LP
/// character set and made unique.
///
/// Rows without variables are written as comments when they hold. A
/// violated one is kept as a row with a zero coefficient so the file stays
/// infeasible; without any variable to carry it the write fails with
/// [`io::ErrorKind::InvalidInput`].
pub fn write_lp<W: Write>(model: &Model, mut out: W) -> io::Result<()> {
    let names = lp_names(model);
    let stats = model.stats();
    writeln!(
        out,
        "\\ {} variables, {} constraints, {} lazy cuts",
        stats.variables, stats.constraints, stats.lazy_cuts
    )?;

    match model.objective() {
        Some(objective) => {
            let sense = match objective.sense {
                Sense::Maximize => "Maximize",
                Sense::Minimize => "Minimize",
            };
            writeln!(out, "{}", sense)?;
            write!(out, " obj:")?;
            write_terms(&mut out, &objective.expr, &names)?;
            if objective.expr.offset() != 0.0 {
                write!(out, " {}", signed(objective.expr.offset()))?;
            }
            writeln!(out)?;
        }
        None => {
            writeln!(out, "Maximize")?;
            writeln!(out, " obj:")?;
        }
    }

    writeln!(out, "Subject To")?;
    let mut used = HashSet::new();
    for (i, constraint) in model.constraints().iter().enumerate() {
        write_constraint(&mut out, constraint, &names, &format!("c{}", i), &mut used)?;
    }

    if !model.lazy_cuts().is_empty() {
        writeln!(out, "Lazy Constraints")?;
        for (i, cut) in model.lazy_cuts().iter().enumerate() {
            write_constraint(
                &mut out,
                &cut.constraint(),
                &names,
                &format!("l{}", i),
                &mut used,
            )?;
        }
    }

    writeln!(out, "Bounds")?;
    for (var, name) in model.variables().iter().zip(&names) {
        if var.kind == VarKind::Binary {
            continue;
        }
        if var.is_free() {
            writeln!(out, " {} free", name)?;
        } else if var.lower != 0.0 || var.upper != f64::INFINITY {
            writeln!(
                out,
                " {} <= {} <= {}",
                bound(var.lower),
                name,
                bound(var.upper)
            )?;
        }
    }

    let binaries: Vec<&str> = model
        .variables()
        .iter()
        .zip(&names)
        .filter(|(v, _)| v.kind == VarKind::Binary)
        .map(|(_, n)| n.as_str())
        .collect();
    if !binaries.is_empty() {
        writeln!(out, "Binaries")?;
        for chunk in binaries.chunks(8) {
            writeln!(out, " {}", chunk.join(" "))?;
        }
    }

    writeln!(out, "End")
}

fn write_constraint<W: Write>(
    out: &mut W,
    constraint: &Constraint,
    names: &[String],
    fallback: &str,
    used: &mut HashSet<String>,
) -> io::Result<()> {
    let lhs = constraint.lhs().simplified();
    let label = unique(
        constraint.name().map_or_else(|| fallback.to_string(), sanitize),
        used,
    );
    let op = match constraint.comparison() {
        Comparison::Le => "<=",
        Comparison::Ge => ">=",
        Comparison::Eq => "=",
    };
    if lhs.terms().is_empty() {
        if constraint.is_satisfied(&[], CONSTANT_ROW_TOL) {
            return writeln!(out, "\\ {}: constant row omitted", label);
        }
        let carrier = names.first().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "constraint {} is infeasible (0 {} {}) and the model has no variables",
                    label,
                    op,
                    constraint.rhs()
                ),
            )
        })?;
        return writeln!(out, " {}: + 0 {} {} {}", label, carrier, op, constraint.rhs());
    }
    write!(out, " {}:", label)?;
    write_terms(out, &lhs, names)?;
    writeln!(out, " {} {}", op, constraint.rhs())
}

fn write_terms<W: Write>(out: &mut W, expr: &LinearExpr, names: &[String]) -> io::Result<()> {
    for &(var, coef) in expr.terms() {
        write!(out, " {} {}", signed(coef), names[var.index()])?;
    }
    Ok(())
}

fn signed(value: f64) -> String {
    if value < 0.0 {
        format!("- {}", -value)
    } else {
        format!("+ {}", value)
    }
}

fn bound(value: f64) -> String {
    if value == f64::INFINITY {
        "+inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        value.to_string()
    }
}

/// Variable names in LP syntax, unique, in variable order.
fn lp_names(model: &Model) -> Vec<String> {
    let mut used = HashSet::new();
    model
        .variables()
        .iter()
        .enumerate()
        .map(|(i, var)| {
            let name = var
                .name
                .as_deref()
                .map_or_else(|| format!("v{}", i), sanitize);
            unique(name, &mut used)
        })
        .collect()
}

fn unique(name: String, used: &mut HashSet<String>) -> String {
    let mut candidate = name.clone();
    let mut n = 1;
    while used.contains(&candidate) {
        candidate = format!("{}#{}", name, n);
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Map a name onto the LP identifier alphabet.
fn sanitize(name: &str) -> String {
    const EXTRA: &str = "!\"#$%&()/,.;?@_`'{}|~";
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || EXTRA.contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        out.insert(0, '_');
    }
    out
}
