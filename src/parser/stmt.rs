//! Statements and blocks

use super::Parser;
use super::expr::CallSite;
use crate::diagnostics::{CompileError, Result};
use crate::expr::Expression;
use crate::lexer::{Token, TokenKind};
use crate::resolve::{BLANK, VarId};
use crate::types::{DataType, format_list, unify};
use rustc_hash::FxHashSet;
use tracing::trace;

/// Where an assignment appears; `for` headers restrict the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AssignPosition {
    Statement,
    ForInit,
    ForStep,
}

/// A resolved left-hand side of `=` or `:=`
enum Target {
    Blank,
    Existing(VarId),
    /// Declared once the right-hand side has been parsed
    New(Token),
}

/// A target after declaration: its variable and frame slot, or `None` for `_`
type Bound = Option<(VarId, String)>;

impl Parser<'_> {
    /// `(statement? EOL)*` up to the closing `}`
    pub(super) fn parse_block(&mut self) -> Result<()> {
        loop {
            match self.current.kind {
                TokenKind::RBrace => return Ok(()),
                TokenKind::Eol => {
                    self.advance()?;
                }
                _ => {
                    self.parse_statement()?;
                    self.expect(TokenKind::Eol)?;
                }
            }
        }
    }

    /// `{ EOL block }` in a fresh scope
    fn parse_nested_block(&mut self) -> Result<()> {
        self.expect(TokenKind::LBrace)?;
        self.expect(TokenKind::Eol)?;
        self.symbols.push_scope();
        self.parse_block()?;
        self.symbols.pop_scope();
        self.expect(TokenKind::RBrace)?;
        Ok(())
    }

    fn parse_statement(&mut self) -> Result<()> {
        trace!(line = self.current.line, token = %self.current.describe(), "statement");
        let kind = self.current.kind;
        match kind {
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Ident if self.peek()? == TokenKind::LParen => self.parse_call_statement(),
            kind if kind.is_builtin() => self.parse_call_statement(),
            TokenKind::Ident | TokenKind::Underscore => {
                self.parse_assignment(AssignPosition::Statement)
            }
            _ => Err(self.syntax_error("a statement")),
        }
    }

    // ==================== CONTROL FLOW ====================

    fn parse_if(&mut self) -> Result<()> {
        self.expect(TokenKind::If)?;
        let label = self.emitter.next_label()?;

        let condition = self.parse_condition()?;
        self.emitter.condition(&condition, &self.symbols)?;
        self.emitter.if_start(&label);
        self.parse_nested_block()?;

        self.expect(TokenKind::Else)?;
        self.emitter.if_else(&label);
        self.parse_nested_block()?;
        self.emitter.if_end(&label);
        Ok(())
    }

    fn parse_for(&mut self) -> Result<()> {
        self.expect(TokenKind::For)?;
        let label = self.emitter.next_label()?;

        // variables declared in the header live until the loop ends
        self.symbols.push_scope();
        if !self.at(TokenKind::Semi) {
            self.parse_assignment(AssignPosition::ForInit)?;
        }
        self.expect(TokenKind::Semi)?;

        self.emitter.for_start(&label);
        let condition = self.parse_condition()?;
        self.emitter.condition(&condition, &self.symbols)?;
        self.emitter.for_check(&label);
        self.expect(TokenKind::Semi)?;

        self.emitter.begin_capture();
        if !self.at(TokenKind::LBrace) {
            self.parse_assignment(AssignPosition::ForStep)?;
        }
        let step = self.emitter.end_capture()?;

        self.parse_nested_block()?;
        self.emitter.for_end(&label, &step);
        self.symbols.pop_scope();
        Ok(())
    }

    /// An expression with exactly one comparison
    fn parse_condition(&mut self) -> Result<Expression> {
        let start = self.current.clone();
        let condition = self.parse_expression()?;
        if condition.relational.is_none() {
            return Err(CompileError::type_compat(
                "condition must be a comparison",
                start.line,
                start.span,
            ));
        }
        Ok(condition)
    }

    fn parse_return(&mut self) -> Result<()> {
        let keyword = self.expect(TokenKind::Return)?;
        let expected = self.context()?.returns.clone();

        let values = if self.at(TokenKind::Eol) {
            Vec::new()
        } else {
            self.parse_expression_list()?
        };

        let found: Vec<DataType> = values.iter().map(|v| v.ty).collect();
        let compatible = found.len() == expected.len()
            && found
                .iter()
                .zip(&expected)
                .all(|(&f, &e)| unify(f, e).is_some());
        if !compatible {
            return Err(CompileError::params(
                format!(
                    "return of {} in a function returning {}",
                    format_list(&found),
                    format_list(&expected)
                ),
                keyword.line,
                keyword.span,
            ));
        }

        for value in &values {
            self.emitter.expression(value, &self.symbols)?;
        }
        self.emitter.return_values(values.len())?;
        if let Some(context) = self.function.as_mut() {
            context.used_return = true;
        }
        Ok(())
    }

    // ==================== CALLS ====================

    fn parse_call_statement(&mut self) -> Result<()> {
        let call = self.parse_call()?;
        self.emitter.call(&call.callee, call.convention, &call.args);
        Ok(())
    }

    // ==================== ASSIGNMENT ====================

    pub(super) fn parse_assignment(&mut self, position: AssignPosition) -> Result<()> {
        let mut names = vec![self.parse_target_name()?];
        while self.at(TokenKind::Comma) {
            self.advance()?;
            names.push(self.parse_target_name()?);
        }

        let declare = match self.current.kind {
            TokenKind::Define if position != AssignPosition::ForStep => true,
            TokenKind::Assign => false,
            _ if position == AssignPosition::ForStep => return Err(self.syntax_error("`=`")),
            _ => return Err(self.syntax_error("`:=` or `=`")),
        };
        let operator = self.advance()?;
        let targets = self.resolve_targets(names, declare)?;

        if self.starts_call()? {
            let call = self.parse_call()?;
            if self.ends_expression_list() {
                return self.assign_call(targets, call);
            }
            let first = self.call_operand(call)?;
            let mut values = vec![self.parse_expression_from(Some(first))?];
            if self.at(TokenKind::Comma) {
                self.advance()?;
                values.extend(self.parse_expression_list()?);
            }
            return self.assign_values(targets, values, &operator);
        }

        let values = self.parse_expression_list()?;
        self.assign_values(targets, values, &operator)
    }

    fn parse_target_name(&mut self) -> Result<Token> {
        match self.current.kind {
            TokenKind::Ident | TokenKind::Underscore => self.advance(),
            _ => Err(self.syntax_error("an identifier or `_`")),
        }
    }

    fn resolve_targets(&mut self, names: Vec<Token>, declare: bool) -> Result<Vec<Target>> {
        let mut seen = FxHashSet::default();
        let mut targets = Vec::with_capacity(names.len());
        for name in names {
            if name.text == BLANK {
                targets.push(Target::Blank);
                continue;
            }
            if declare {
                if self.symbols.lookup_current(&name.text).is_some() || !seen.insert(name.text.clone())
                {
                    return Err(CompileError::undefined(
                        format!("variable `{}` is already declared in this scope", name.text),
                        name.line,
                        name.span,
                    ));
                }
                targets.push(Target::New(name));
            } else {
                let id = self.symbols.lookup(&name.text).ok_or_else(|| {
                    CompileError::undefined(
                        format!("undefined variable `{}`", name.text),
                        name.line,
                        name.span,
                    )
                })?;
                targets.push(Target::Existing(id));
            }
        }
        Ok(targets)
    }

    /// Declare pending targets; `None` stands for `_`
    fn bind_targets(&mut self, targets: Vec<Target>, types: &[DataType]) -> Result<Vec<Bound>> {
        let mut bound = Vec::with_capacity(targets.len());
        for (target, &ty) in targets.into_iter().zip(types) {
            match target {
                Target::Blank => bound.push(None),
                Target::Existing(id) => bound.push(Some((id, self.symbols.get(id).slot()))),
                Target::New(name) => {
                    let declared = self
                        .symbols
                        .declare(&name.text, ty)
                        .map_err(|msg| CompileError::undefined(msg, name.line, name.span))?;
                    let slot = self.symbols.get(declared.id).slot();
                    if declared.new_slot {
                        self.emitter.declare(&slot)?;
                    }
                    bound.push(Some((declared.id, slot)));
                }
            }
        }
        Ok(bound)
    }

    fn slots(bound: &[Bound]) -> Vec<Option<String>> {
        bound
            .iter()
            .map(|b| b.as_ref().map(|(_, slot)| slot.clone()))
            .collect()
    }

    /// `a, b := f(x)`: one call, one target per returned value
    fn assign_call(&mut self, targets: Vec<Target>, call: CallSite) -> Result<()> {
        let known = self
            .functions
            .get(&call.callee)
            .filter(|sig| sig.returns.len() == targets.len())
            .map(|sig| sig.returns.clone());
        let known_return = |i: usize| {
            known
                .as_ref()
                .and_then(|returns| returns.get(i).copied())
                .unwrap_or(DataType::Untyped)
        };

        let types: Vec<DataType> = targets
            .iter()
            .enumerate()
            .map(|(i, target)| match target {
                Target::Blank => DataType::Untyped,
                Target::Existing(id) => match self.symbols.get(*id).ty {
                    DataType::Untyped => known_return(i),
                    ty => ty,
                },
                Target::New(_) => known_return(i),
            })
            .collect();
        self.functions.call_mut(call.id).returns = types.clone();
        for (target, &ty) in targets.iter().zip(&types) {
            if let Target::Existing(id) = target {
                self.settle_type(*id, ty);
            }
        }

        let bound = self.bind_targets(targets, &types)?;
        self.emitter.call(&call.callee, call.convention, &call.args);
        self.emitter.store_results(&Self::slots(&bound));
        for (id, _) in bound.into_iter().flatten() {
            self.symbols.get_mut(id).constant = None;
        }
        Ok(())
    }

    /// `a, b = x + 1, y`: one expression per target
    fn assign_values(
        &mut self,
        targets: Vec<Target>,
        values: Vec<Expression>,
        operator: &Token,
    ) -> Result<()> {
        if values.len() != targets.len() {
            return Err(CompileError::params(
                format!(
                    "{} value(s) assigned to {} target(s)",
                    values.len(),
                    targets.len()
                ),
                operator.line,
                operator.span,
            ));
        }

        let mut types = Vec::with_capacity(values.len());
        for (target, value) in targets.iter().zip(&values) {
            if value.relational.is_some() {
                return Err(CompileError::type_compat(
                    "a comparison cannot be assigned",
                    operator.line,
                    operator.span,
                ));
            }
            match target {
                Target::Existing(id) => {
                    let variable = self.symbols.get(*id);
                    let Some(ty) = unify(variable.ty, value.ty) else {
                        return Err(CompileError::type_compat(
                            format!(
                                "cannot assign {} to `{}` of type {}",
                                value.ty, variable.name, variable.ty
                            ),
                            operator.line,
                            operator.span,
                        ));
                    };
                    self.settle_type(*id, ty);
                    types.push(ty);
                }
                Target::Blank | Target::New(_) => types.push(value.ty),
            }
        }

        for value in &values {
            self.emitter.expression(value, &self.symbols)?;
        }
        let bound = self.bind_targets(targets, &types)?;
        self.emitter.store(&Self::slots(&bound));

        let straight = self.symbols.depth() == 1;
        for (target, value) in bound.into_iter().zip(&values) {
            if let Some((id, _)) = target {
                self.symbols.get_mut(id).constant = if straight { value.constant() } else { None };
            }
        }
        Ok(())
    }
}
