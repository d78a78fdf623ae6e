use crate::ast::{Expr, FunctionDecl, LiteralValue, Stmt};
use crate::value::format_number;

/// Renders syntax trees in a parenthesised prefix form, e.g. `1 + 2 * 3`
/// becomes `(+ 1 (* 2 3))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "verdadeiro".into(),

                LiteralValue::False => "falso".into(),

                LiteralValue::Nil => "nulo".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => format_number(*n),
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => parenthesize(&operator.lexeme, [&**left, &**right]),

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => parenthesize("?:", [&**condition, &**then_branch, &**else_branch]),

            // ── names ───────────────────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::This { keyword, .. } => keyword.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            // ── calls and objects ───────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Lambda(decl) => function("lambda", decl),

            Expr::Array { elements, .. } => parenthesize("array", elements),

            Expr::Index { array, index, .. } => {
                parenthesize("index", [&**array, &**index])
            }

            Expr::IndexSet {
                array,
                index,
                value,
                ..
            } => parenthesize("index=", [&**array, &**index, &**value]),

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(.= {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(escreva {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(expr) => format!("(var {} {})", name.lexeme, Self::print(expr)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => block("block", statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(se {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(se {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While {
                condition, body, ..
            } => format!(
                "(enquanto {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Break(_) => "(pare)".into(),

            Stmt::Continue(_) => "(continue)".into(),

            Stmt::Function(decl) => function("funcao", decl),

            Stmt::Return { value, .. } => match value {
                Some(expr) => format!("(retorne {})", Self::print(expr)),
                None => "(retorne)".into(),
            },

            Stmt::Class { name, methods } => {
                let mut s = format!("(classe {}", name.lexeme);
                for method in methods {
                    s.push(' ');
                    s.push_str(&function("metodo", method));
                }
                s.push(')');
                s
            }
        }
    }
}

fn parenthesize<'e>(name: &str, exprs: impl IntoIterator<Item = &'e Expr>) -> String {
    let mut s = format!("({}", name);
    for expr in exprs {
        s.push(' ');
        s.push_str(&AstPrinter::print(expr));
    }
    s.push(')');
    s
}

fn block(name: &str, statements: &[Stmt]) -> String {
    let mut s = format!("({}", name);
    for stmt in statements {
        s.push(' ');
        s.push_str(&AstPrinter::print_stmt(stmt));
    }
    s.push(')');
    s
}

fn function(kind: &str, decl: &FunctionDecl) -> String {
    let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
    let header = match &decl.name {
        Some(name) => format!("{} {} ({})", kind, name.lexeme, params.join(" ")),
        None => format!("{} ({})", kind, params.join(" ")),
    };

    block(&header, &decl.body)
}
