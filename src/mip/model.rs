//! Engine-neutral mixed-integer model: variables, linear expressions, and
//! constraints.

use std::fmt;

/// Handle to a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(usize);

impl Var {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Domain of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Continuous,
    Integer,
    Binary,
}

impl VarType {
    pub fn is_integral(self) -> bool {
        !matches!(self, VarType::Continuous)
    }
}

/// Variable declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub lb: f64,
    pub ub: f64,
    pub ty: VarType,
    /// Branching priority; higher values are branched on first.
    pub priority: i32,
}

/// A linear expression `Σ coef·var`.
///
/// # Examples
///
/// ```
/// use fair_mtsp::mip::{LinExpr, Model, VarType};
///
/// let mut model = Model::new();
/// let x = model.add_var("x", 0.0, 1.0, VarType::Binary);
/// let y = model.add_var("y", 0.0, 1.0, VarType::Binary);
///
/// let mut expr = LinExpr::new();
/// expr.add(x, 1.0);
/// expr.add(y, 2.0);
/// expr.add(x, -1.0);
/// let expr = expr.normalized();
/// assert_eq!(expr.terms(), &[(y, 2.0)]);
/// assert_eq!(expr.eval(&[1.0, 0.5]), 1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(Var, f64)>,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `coef·var`. Repeated variables are merged by [`normalized`](Self::normalized).
    pub fn add(&mut self, var: Var, coef: f64) {
        self.terms.push((var, coef));
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, var: Var, coef: f64) -> Self {
        self.add(var, coef);
        self
    }

    pub fn terms(&self) -> &[(Var, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Sorts terms by variable, merges duplicates, and drops zero coefficients.
    pub fn normalized(mut self) -> Self {
        self.terms.sort_by_key(|&(var, _)| var);
        let mut merged: Vec<(Var, f64)> = Vec::with_capacity(self.terms.len());
        for (var, coef) in self.terms {
            match merged.last_mut() {
                Some((last, acc)) if *last == var => *acc += coef,
                _ => merged.push((var, coef)),
            }
        }
        merged.retain(|&(_, coef)| coef != 0.0);
        Self { terms: merged }
    }

    /// Evaluates the expression at a dense value vector.
    pub fn eval(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coef)| coef * values[var.index()])
            .sum()
    }

    /// `true` when every coefficient is a finite number.
    pub fn is_finite(&self) -> bool {
        self.terms.iter().all(|&(_, coef)| coef.is_finite())
    }
}

impl FromIterator<(Var, f64)> for LinExpr {
    fn from_iter<I: IntoIterator<Item = (Var, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

/// Relation between the left-hand and right-hand side of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        })
    }
}

/// A named linear constraint `expr (<=|>=|=) rhs` with a normalized expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    name: String,
    expr: LinExpr,
    sense: Sense,
    rhs: f64,
}

impl Constraint {
    pub fn new(name: impl Into<String>, expr: LinExpr, sense: Sense, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr: expr.normalized(),
            sense,
            rhs,
        }
    }

    pub fn le(name: impl Into<String>, expr: LinExpr, rhs: f64) -> Self {
        Self::new(name, expr, Sense::Le, rhs)
    }

    pub fn ge(name: impl Into<String>, expr: LinExpr, rhs: f64) -> Self {
        Self::new(name, expr, Sense::Ge, rhs)
    }

    pub fn equals(name: impl Into<String>, expr: LinExpr, rhs: f64) -> Self {
        Self::new(name, expr, Sense::Eq, rhs)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expr(&self) -> &LinExpr {
        &self.expr
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Amount by which `values` violates the constraint; zero or negative
    /// when satisfied.
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.expr.eval(values);
        match self.sense {
            Sense::Le => lhs - self.rhs,
            Sense::Ge => self.rhs - lhs,
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.expr.is_finite() && self.rhs.is_finite()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.name)?;
        for (i, &(var, coef)) in self.expr.terms().iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{coef}*x{}", var.index())?;
        }
        write!(f, " {} {}", self.sense, self.rhs)
    }
}

/// A minimization model over [`Var`]s.
#[derive(Debug, Clone, Default)]
pub struct Model {
    vars: Vec<VarDef>,
    constraints: Vec<Constraint>,
    objective: LinExpr,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable with bounds `[lb, ub]`. Binary variables are clipped to `[0, 1]`.
    pub fn add_var(&mut self, name: impl Into<String>, lb: f64, ub: f64, ty: VarType) -> Var {
        let (lb, ub) = match ty {
            VarType::Binary => (lb.max(0.0), ub.min(1.0)),
            _ => (lb, ub),
        };
        self.vars.push(VarDef {
            name: name.into(),
            lb,
            ub,
            ty,
            priority: 0,
        });
        Var(self.vars.len() - 1)
    }

    pub fn set_priority(&mut self, var: Var, priority: i32) {
        self.vars[var.index()].priority = priority;
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Sets the linear objective to minimize.
    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective.normalized();
    }

    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn var(&self, var: Var) -> &VarDef {
        &self.vars[var.index()]
    }

    /// Handles of all variables in creation order.
    pub fn var_handles(&self) -> impl Iterator<Item = Var> {
        (0..self.vars.len()).map(Var)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.eval(values)
    }

    /// Checks bounds, integrality, and every model constraint at `values`.
    ///
    /// Returns the name of the first violated item, or `None` if the point is
    /// feasible within `tol`.
    pub fn first_violation(&self, values: &[f64], tol: f64) -> Option<String> {
        if values.len() != self.vars.len() {
            return Some(format!(
                "expected {} values, got {}",
                self.vars.len(),
                values.len()
            ));
        }
        for (def, &value) in self.vars.iter().zip(values) {
            if !value.is_finite() || value < def.lb - tol || value > def.ub + tol {
                return Some(format!("bound of {}", def.name));
            }
            if def.ty.is_integral() && (value - value.round()).abs() > tol {
                return Some(format!("integrality of {}", def.name));
            }
        }
        self.constraints
            .iter()
            .find(|c| c.violation(values) > tol)
            .map(|c| c.name().to_string())
    }
}
