//! The action-symbol catalogue and code generator (§4.3–§4.6).
//!
//! `ActionSymbol` enumerates the ~40 actions of §4.3's table as a tagged
//! variant (§9: "enumerate action symbols as a tagged variant, and
//! implement dispatch as a single exhaustive match" — replacing the
//! source's decorator-registry reflection). `CodeGenerator` owns every
//! piece of shared compiler state §3 names: the program block, semantic
//! stack, symbol table, scope manager, and machine state/register file.
//!
//! Grounded on `original_source/cminus/codegen/codegen.py` (`CodeGenerator`,
//! `ActionSymbol`) for the call protocol's mechanics (`store`/`push_args`/
//! `restore`/`collect`), generalized with the typed `Value`/`IdKind` checks
//! §4.3's table adds (`pid`'s undefined check, `op_exec`'s operand-kind
//! check, `function_call`'s arity/type check, `check_declaration_type`) —
//! none of which the given revision of `codegen.py` implements, per the
//! "most feature-complete revision" resolution recorded in DESIGN.md.

use cminus_lex::Token;
use cminus_util::{Handler, Symbol};

use crate::instruction::{Instruction, Operation, ProgramBlock};
use crate::machine::{ActivationsStack, CodegenConfig, MachineState, RegisterFile};
use crate::scope_manager::{ScopeManager, ScopeType};
use crate::semantic_stack::SemanticStack;
use crate::symbol_table::SymbolTable;
use crate::value::{IdKind, Value};

/// The ~40 named action symbols of §4.3's table. Variants that need more
/// than a bare trigger carry the token (for its lexeme/line) that the
/// firing transition consumed, or a raw line number when only the source
/// position matters.
#[derive(Clone, Debug)]
pub enum ActionSymbol<'src> {
    Pid(Token<'src>),
    Pnum(Token<'src>),
    Prv,
    Parray,
    Ptype(Token<'src>),
    Pop,
    Declare,
    DeclareId(Token<'src>),
    DeclareArray,
    ArrayType,
    CaptureParamType,
    DeclareFunction(Token<'src>),
    CheckDeclarationType(u32),
    Assign,
    OpPush(Token<'src>),
    OpExec(u32),
    Hold,
    Label,
    Decide,
    JpfRepeat,
    FunctionCall(Token<'src>),
    FunctionReturn,
    ArgInit,
    ArgFinish,
    ArgPass,
    FunctionScope,
    ContainerScope,
    TemporaryScope,
    SimpleScope,
    ScopeStart,
    ScopeEnd,
    Prison(ScopeType),
    PrisonBreak(ScopeType),
    CheckInContainer(u32),
}

/// Identifiers keyword-cased for semantic error message templates (§6).
fn kind_name(kind: IdKind) -> &'static str {
    match kind {
        IdKind::Int => "int",
        IdKind::Void => "void",
        IdKind::Array => "array",
        IdKind::Function => "function",
        IdKind::Unspecified => "unspecified",
    }
}

pub struct CodeGenerator<'src> {
    config: CodegenConfig,
    pb: ProgramBlock,
    state: MachineState,
    rf: RegisterFile,
    as_: ActivationsStack,
    scope: ScopeManager,
    ss: SemanticStack,
    pub symtab: SymbolTable,
    semantic: Handler,
    /// Reserved slots from `init_rf`: one patched by `set_main_ra` to
    /// `ASSIGN #<halt address> -> ra`, the other patched by `exec_main` to
    /// `JP main`, mirroring the two-instruction tail of `function_call`'s own
    /// call protocol (set the return address, then jump).
    main_ra_slot: Option<usize>,
    main_jp_slot: Option<usize>,
    /// Text and symbol of the most recently `declare_id`'d identifier, for
    /// `check_declaration_type`'s message and `declare_array`'s re-lookup.
    last_declared_name: Option<&'src str>,
    last_declared_symbol: Option<Symbol>,
    output_address: i64,
}

impl<'src> CodeGenerator<'src> {
    /// `output_symbol` is the interned handle for the literal identifier
    /// `"output"`, registered as a builtin function so ordinary
    /// `function_call` machinery (arity/type checking, jump-and-link)
    /// handles calls to it uniformly with user-declared functions.
    pub fn new(config: CodegenConfig, output_symbol: Symbol) -> Self {
        let mut pb = ProgramBlock::new();
        let mut state = MachineState::new(config);
        let rf = RegisterFile {
            sp: state.getvar(1),
            fp: state.getvar(1),
            ra: state.getvar(1),
            rv: state.getvar(1),
        };
        let as_ = ActivationsStack::new(config, rf);

        // init_rf (§4.3): establish sp/fp, reserve two patch slots for the
        // eventual `ASSIGN ra` / `JP main` pair, and zero rv.
        pb.append(Instruction::two(
            Operation::Assign,
            Value::immediate(config.stack_start, IdKind::Int),
            Value::direct(rf.sp, IdKind::Unspecified),
        ));
        pb.append(Instruction::two(
            Operation::Assign,
            Value::immediate(config.stack_start, IdKind::Int),
            Value::direct(rf.fp, IdKind::Unspecified),
        ));
        let main_ra_slot = pb.i();
        pb.append(Instruction::empty());
        let main_jp_slot = pb.i();
        pb.append(Instruction::empty());
        pb.append(Instruction::two(
            Operation::Assign,
            Value::immediate(0, IdKind::Int),
            Value::direct(rf.rv, IdKind::Unspecified),
        ));

        // The `output` builtin (§4.3 `output`): pop its one argument into
        // rv, print it, return to the caller.
        let output_address = pb.i();
        as_.pop(&mut pb, Value::direct(rf.rv, IdKind::Unspecified));
        pb.append(Instruction::one(Operation::Print, Value::direct(rf.rv, IdKind::Unspecified)));
        pb.append(Instruction::one(Operation::Jp, Value::indirect(rf.ra, IdKind::Unspecified)));

        let mut symtab = SymbolTable::new();
        let rec = symtab.add_symbol(output_symbol, true).expect("global scope accepts forced add");
        rec.address = Some(output_address);
        rec.kind = IdKind::Function;
        rec.params = vec![IdKind::Int];
        rec.return_kind = IdKind::Void;

        Self {
            config,
            pb,
            state,
            rf,
            as_,
            scope: ScopeManager::new(),
            ss: SemanticStack::new(),
            symtab,
            semantic: Handler::new(),
            main_ra_slot: Some(main_ra_slot),
            main_jp_slot: Some(main_jp_slot),
            last_declared_name: None,
            last_declared_symbol: None,
            output_address,
        }
    }

    pub fn program_block(&self) -> &ProgramBlock {
        &self.pb
    }

    pub fn semantic_errors(&self) -> &Handler {
        &self.semantic
    }

    pub fn has_semantic_errors(&self) -> bool {
        self.semantic.has_errors()
    }

    pub fn output_builtin_address(&self) -> i64 {
        self.output_address
    }

    /// Lets the parser guard `Prison(Container)` for `break`: firing it
    /// outside any open `repeat` would panic (`Layer::prison` has no jail to
    /// reserve a slot in), so `statement` checks this before dispatching.
    pub fn is_inside(&self, kind: ScopeType) -> bool {
        self.scope.are_we_inside(kind)
    }

    fn error(&self, line: u32, message: impl Into<String>) {
        self.semantic.emit(line, message);
    }

    /// Pushes a degraded `Value::undefined()` in place of a `factor` the
    /// parser failed to match (§4.2 panic mode: "missing factor" takes the
    /// transition without consuming a token). Keeps the semantic stack's
    /// balance law (§3, §8) intact across syntax-error recovery: every
    /// caller that expects `factor`/`factor_zegond` to leave one operand on
    /// the stack still gets one.
    pub fn push_recovery_value(&mut self) {
        self.ss.push_value(Value::undefined());
    }

    pub fn dispatch(&mut self, symbol: ActionSymbol<'src>) {
        match symbol {
            ActionSymbol::Pid(token) => self.pid(token),
            ActionSymbol::Pnum(token) => self.pnum(token),
            ActionSymbol::Prv => self.prv(),
            ActionSymbol::Parray => self.parray(),
            ActionSymbol::Ptype(token) => self.ptype(token),
            ActionSymbol::Pop => self.pop(),
            ActionSymbol::Declare => self.declare(),
            ActionSymbol::DeclareId(token) => self.declare_id(token),
            ActionSymbol::DeclareArray => self.declare_array(),
            ActionSymbol::ArrayType => self.array_type(),
            ActionSymbol::CaptureParamType => self.capture_param_type(),
            ActionSymbol::DeclareFunction(token) => self.declare_function(token),
            ActionSymbol::CheckDeclarationType(line) => self.check_declaration_type(line),
            ActionSymbol::Assign => self.assign(),
            ActionSymbol::OpPush(token) => self.op_push(token),
            ActionSymbol::OpExec(line) => self.op_exec(line),
            ActionSymbol::Hold => self.hold(),
            ActionSymbol::Label => self.label(),
            ActionSymbol::Decide => self.decide(),
            ActionSymbol::JpfRepeat => self.jpf_repeat(),
            ActionSymbol::FunctionCall(token) => self.function_call(token),
            ActionSymbol::FunctionReturn => self.function_return(),
            ActionSymbol::ArgInit => self.arg_init(),
            ActionSymbol::ArgFinish => self.arg_finish(),
            ActionSymbol::ArgPass => self.arg_pass(),
            ActionSymbol::FunctionScope => self.scope.stage(ScopeType::Function),
            ActionSymbol::ContainerScope => self.scope.stage(ScopeType::Container),
            ActionSymbol::TemporaryScope => self.scope.stage(ScopeType::Temporary),
            ActionSymbol::SimpleScope => self.scope.stage(ScopeType::Simple),
            ActionSymbol::ScopeStart => self.scope.create_scope(&self.state, &self.as_, &mut self.pb),
            ActionSymbol::ScopeEnd => self.scope_end(),
            ActionSymbol::Prison(kind) => self.scope.prison(kind, &mut self.pb),
            ActionSymbol::PrisonBreak(kind) => self.scope.prison_break(kind, &mut self.pb),
            ActionSymbol::CheckInContainer(line) => self.check_in_container(line),
        }
    }

    fn pid(&mut self, token: Token<'src>) {
        let symbol = token.symbol.expect("ID token carries an interned symbol");
        match self.symtab.lookup(symbol) {
            Some(id) => {
                let address = id.address.unwrap_or(-1);
                self.ss.push_value(Value::direct(address, id.kind));
            }
            None => {
                self.error(token.line, format!("'{}' is not defined.", token.lexeme));
                self.ss.push_value(Value::undefined());
            }
        }
    }

    fn pnum(&mut self, token: Token<'src>) {
        let n: i64 = token.lexeme.parse().unwrap_or(0);
        self.ss.push_value(Value::immediate(n, IdKind::Int));
    }

    fn prv(&mut self) {
        self.ss.push_value(Value::direct(self.rf.rv, IdKind::Int));
    }

    fn parray(&mut self) {
        let offset = self.ss.pop_value();
        let base = self.ss.pop_value();
        let t = self.state.gettemp();
        self.pb.append(Instruction::new(
            Operation::Mult,
            Value::immediate(self.state.word_size(), IdKind::Int),
            offset,
            Value::direct(t, IdKind::Int),
        ));
        self.pb.append(Instruction::new(
            Operation::Add,
            base,
            Value::direct(t, IdKind::Int),
            Value::direct(t, IdKind::Int),
        ));
        self.ss.push_value(Value::indirect(t, base.kind));
    }

    fn ptype(&mut self, token: Token<'src>) {
        self.state.last_type = match token.lexeme {
            "void" => IdKind::Void,
            _ => IdKind::Int,
        };
    }

    fn pop(&mut self) {
        self.ss.pop();
    }

    fn declare(&mut self) {
        self.symtab.declare();
    }

    fn declare_id(&mut self, token: Token<'src>) {
        let symbol = token.symbol.expect("ID token carries an interned symbol");
        let kind = self.state.last_type;
        let address = self.state.getvar(1);
        {
            let record = self.symtab.add_symbol(symbol, true).expect("declare_id always forces the add");
            record.address = Some(address);
            record.kind = kind;
        }
        self.last_declared_name = Some(token.lexeme);
        self.last_declared_symbol = Some(symbol);

        if self.state.declaring_args {
            self.as_.pop(&mut self.pb, Value::direct(address, kind));
        } else {
            self.pb.append(Instruction::two(
                Operation::Assign,
                Value::immediate(0, IdKind::Int),
                Value::direct(address, kind),
            ));
            self.ss.push_value(Value::direct(address, kind));
        }
    }

    fn declare_array(&mut self) {
        let size = self.ss.pop_value().raw;
        let base = self.ss.peek_value(0);
        self.pb.append(Instruction::two(Operation::Assign, Value::direct(self.rf.sp, IdKind::Unspecified), base));
        self.as_.reserve(&mut self.pb, size);
        if let Some(symbol) = self.last_declared_symbol {
            if let Some(record) = self.symtab.lookup_mut(symbol) {
                record.kind = IdKind::Array;
            }
        }
    }

    fn array_type(&mut self) {
        if let Some(name) = self.state.last_function_name {
            if let Some(record) = self.symtab.lookup_mut(name) {
                if let Some(last) = record.params.last_mut() {
                    *last = IdKind::Array;
                }
            }
        }
    }

    fn capture_param_type(&mut self) {
        let kind = self.state.last_type;
        if let Some(name) = self.state.last_function_name {
            if let Some(record) = self.symtab.lookup_mut(name) {
                record.params.push(kind);
            }
        }
    }

    fn declare_function(&mut self, token: Token<'src>) {
        let symbol = token.symbol.expect("ID token carries an interned symbol");
        let return_kind = self.state.last_type;
        let address = self.pb.i() as i64;
        {
            let record = self.symtab.add_symbol(symbol, true).expect("declare_function always forces the add");
            record.address = Some(address);
            record.kind = IdKind::Function;
            record.return_kind = return_kind;
        }
        self.state.last_function_name = Some(symbol);
        self.state.data_pointer = self.state.data_address;
        self.state.temp_pointer = self.state.temp_address;
    }

    fn check_declaration_type(&mut self, line: u32) {
        if self.state.last_type == IdKind::Void {
            if let Some(name) = self.last_declared_name {
                self.error(line, format!("Illegal type of void for '{}'.", name));
            }
        }
    }

    fn assign(&mut self) {
        let rhs = self.ss.pop_value();
        let lhs = self.ss.peek_value(0);
        self.pb.append(Instruction::two(Operation::Assign, rhs, lhs));
    }

    fn op_push(&mut self, token: Token<'src>) {
        let op = Operation::from_lexeme(token.lexeme).expect("op_push fired on a non-operator lexeme");
        self.ss.push_op(op);
    }

    fn op_exec(&mut self, line: u32) {
        let rhs = self.ss.pop_value();
        let op = self.ss.pop().as_op();
        let lhs = self.ss.pop_value();
        if lhs.kind == IdKind::Void || rhs.kind == IdKind::Void {
            self.error(line, "Type mismatch in operands, Got void instead of int.");
        }
        let t = self.state.gettemp();
        self.pb.append(Instruction::new(op, lhs, rhs, Value::direct(t, IdKind::Int)));
        let result_kind =
            if lhs.kind == IdKind::Unspecified || rhs.kind == IdKind::Unspecified { IdKind::Unspecified } else { IdKind::Int };
        self.ss.push_value(Value::direct(t, result_kind));
    }

    fn hold(&mut self) {
        self.label();
        self.pb.append(Instruction::empty());
    }

    fn label(&mut self) {
        self.ss.push_value(Value::direct(self.pb.i() as i64, IdKind::Unspecified));
    }

    fn decide(&mut self) {
        let reserved = self.ss.pop_value();
        let condition = self.ss.pop_value();
        let target = Value::direct(self.pb.i() as i64, IdKind::Unspecified);
        self.pb.overwrite(reserved.raw as usize, Instruction::two(Operation::Jpf, condition, target));
    }

    fn jpf_repeat(&mut self) {
        let condition = self.ss.pop_value();
        let label = self.ss.pop_value();
        self.pb.append(Instruction::two(Operation::Jpf, condition, label));
    }

    pub fn function_call(&mut self, token: Token<'src>) {
        self.store();
        // `push_args` drains only the entries above `arg_pass`'s recorded
        // depth, which is everything pushed after `pid` put the callee's own
        // address on the stack — so the callee address is still sitting
        // underneath the drained args and must be popped second, not first.
        let args = self.push_args();
        let callee_addr = self.ss.pop_value().raw;
        self.type_check_args(token, callee_addr, &args);

        let ra_target = self.pb.i() as i64 + 2;
        self.pb.append(Instruction::two(
            Operation::Assign,
            Value::immediate(ra_target, IdKind::Int),
            Value::direct(self.rf.ra, IdKind::Unspecified),
        ));
        self.pb.append(Instruction::one(Operation::Jp, Value::direct(callee_addr, IdKind::Unspecified)));
        self.restore();
        self.collect(callee_addr);
    }

    /// §4.4 step 1: save every live data/temp local of the *calling*
    /// function (those allocated since its own `declare_function` snapshot)
    /// onto the runtime stack, then the register file.
    fn store(&mut self) {
        let word = self.config.word_size;
        let mut address = self.state.data_pointer;
        while address < self.state.data_address {
            self.as_.push(&mut self.pb, Value::direct(address, IdKind::Unspecified));
            address += word;
        }
        let mut address = self.state.temp_pointer;
        while address < self.state.temp_address {
            self.as_.push(&mut self.pb, Value::direct(address, IdKind::Unspecified));
            address += word;
        }
        self.as_.push_rf(&mut self.pb);
    }

    /// §4.4 step 2: pushes the call's argument values, left-to-right, so
    /// the callee's parameter declarations (which `as_.pop` in declaration
    /// order) retrieve them in the same order they were written.
    fn push_args(&mut self) -> Vec<Value> {
        let depth = self.state.arg_pointer.pop().unwrap_or_else(|| self.ss.length());
        let args = self.ss.drain_from(depth);
        for arg in args.iter().rev() {
            self.as_.push(&mut self.pb, *arg);
        }
        args
    }

    fn type_check_args(&mut self, token: Token<'src>, callee_addr: i64, args: &[Value]) {
        let Some(record) = self.symtab.lookup_by_instno(callee_addr) else { return };
        if args.len() != record.params.len() {
            self.error(token.line, format!("Mismatch in numbers of arguments of '{}'.", token.lexeme));
            return;
        }
        for (i, (arg, expected)) in args.iter().zip(record.params.iter()).enumerate() {
            if *expected == IdKind::Unspecified || arg.kind == IdKind::Unspecified {
                continue;
            }
            if arg.kind != *expected {
                self.error(
                    token.line,
                    format!(
                        "Mismatch in type of argument {} of '{}'. Expected '{}' but got '{}' instead.",
                        i + 1,
                        token.lexeme,
                        kind_name(*expected),
                        kind_name(arg.kind)
                    ),
                );
            }
        }
    }

    /// §4.4 step 6: undoes `store`, in exact reverse order.
    fn restore(&mut self) {
        self.as_.pop_rf(&mut self.pb);
        let word = self.config.word_size;
        let mut address = self.state.temp_address - word;
        while address >= self.state.temp_pointer {
            self.as_.pop(&mut self.pb, Value::direct(address, IdKind::Unspecified));
            address -= word;
        }
        let mut address = self.state.data_address - word;
        while address >= self.state.data_pointer {
            self.as_.pop(&mut self.pb, Value::direct(address, IdKind::Unspecified));
            address -= word;
        }
    }

    fn collect(&mut self, callee_addr: i64) {
        let return_kind =
            self.symtab.lookup_by_instno(callee_addr).map(|record| record.return_kind).unwrap_or(IdKind::Unspecified);
        let t = self.state.gettemp();
        self.pb.append(Instruction::two(
            Operation::Assign,
            Value::direct(self.rf.rv, IdKind::Unspecified),
            Value::direct(t, return_kind),
        ));
        self.ss.push_value(Value::direct(t, return_kind));
    }

    fn function_return(&mut self) {
        self.pb.append(Instruction::one(Operation::Jp, Value::indirect(self.rf.ra, IdKind::Unspecified)));
    }

    fn arg_init(&mut self) {
        self.state.declaring_args = true;
    }

    fn arg_finish(&mut self) {
        self.state.declaring_args = false;
    }

    fn arg_pass(&mut self) {
        self.state.arg_pointer.push(self.ss.length());
    }

    /// `scope_end`: pops the symbol-table scope and the scope-manager
    /// layer. For a Function scope, all jailed `return`s converge here
    /// (patched by `ScopeManager::delete_scope`'s drain) right before the
    /// single literal `JP @ra` epilogue (§4.4: "implicit epilogue at
    /// `fun_declaration_prime` end pops the frame and emits `JP @ra`").
    fn scope_end(&mut self) {
        self.symtab.delete_scope();
        let was_function = self.scope.pending_kind() == Some(ScopeType::Function);
        self.scope.delete_scope(&mut self.state, &self.as_, &mut self.pb);
        if was_function {
            self.function_return();
        }
    }

    fn check_in_container(&mut self, line: u32) {
        if !self.scope.are_we_inside(ScopeType::Container) {
            self.error(line, "No 'repeat ... until' found for 'break'.");
        }
    }

    /// `set_main_ra`: patches the reserved `init_rf` slot to
    /// `ASSIGN #<halt address> -> ra`, where the halt address is the
    /// program's final instruction count at EOF. `main`'s eventual
    /// `return`'s `JP @ra` (or simply falling off `main`'s closing brace,
    /// which `function_return` treats identically) therefore lands one past
    /// the last emitted instruction rather than falling through into the
    /// `output` builtin's body that immediately follows the prologue — the
    /// same halt-by-running-off-the-end convention `function_call` gives
    /// every other caller, just with no caller frame to return into.
    pub fn set_main_ra(&mut self, halt_pc: i64) {
        let slot = self.main_ra_slot.take().expect("set_main_ra fires exactly once");
        self.pb.overwrite(
            slot,
            Instruction::two(
                Operation::Assign,
                Value::immediate(halt_pc, IdKind::Int),
                Value::direct(self.rf.ra, IdKind::Unspecified),
            ),
        );
    }

    /// `exec_main`: patches the reserved `init_rf` slot to `JP main`, or
    /// emits `'main' is not defined.` if no `main` was ever declared
    /// (§9 Open Question resolution — recorded in DESIGN.md).
    pub fn exec_main(&mut self, main_symbol: Symbol, eof_line: u32) {
        let slot = self.main_jp_slot.take().expect("exec_main fires exactly once");
        match self.symtab.lookup(main_symbol) {
            Some(id) if id.kind == IdKind::Function => {
                let target = Value::direct(id.address.unwrap_or(0), IdKind::Unspecified);
                self.pb.overwrite(slot, Instruction::one(Operation::Jp, target));
            }
            _ => {
                self.error(eof_line, "'main' is not defined.".to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cminus_lex::TokenKind;
    use proptest::prelude::*;

    #[test]
    fn pid_of_declared_variable_pushes_its_address() {
        let arena = bumpalo::Bump::new();
        let mut interner = cminus_util::Interner::new(&arena);
        let output = interner.intern("output");
        let mut gen = CodeGenerator::new(CodegenConfig::default(), output);
        let x = interner.intern("x");
        gen.dispatch(ActionSymbol::Declare);
        let decl_tok = Token::with_symbol(TokenKind::Id, "x", 1, x);
        gen.dispatch(ActionSymbol::Ptype(Token::new(TokenKind::Keyword, "int", 1)));
        gen.dispatch(ActionSymbol::DeclareId(decl_tok.clone()));
        gen.dispatch(ActionSymbol::Pop);
        gen.dispatch(ActionSymbol::Pid(decl_tok));
        assert!(!gen.has_semantic_errors());
    }

    #[test]
    fn pid_of_undefined_identifier_emits_not_defined_error() {
        let arena = bumpalo::Bump::new();
        let mut interner = cminus_util::Interner::new(&arena);
        let output = interner.intern("output");
        let mut gen = CodeGenerator::new(CodegenConfig::default(), output);
        let y = interner.intern("y");
        let tok = Token::with_symbol(TokenKind::Id, "y", 3, y);
        gen.dispatch(ActionSymbol::Pid(tok));
        assert!(gen.has_semantic_errors());
        assert_eq!(gen.semantic_errors().diagnostics()[0].message, "'y' is not defined.");
    }

    #[test]
    fn op_exec_on_void_operand_emits_type_mismatch() {
        let arena = bumpalo::Bump::new();
        let mut interner = cminus_util::Interner::new(&arena);
        let output = interner.intern("output");
        let mut gen = CodeGenerator::new(CodegenConfig::default(), output);
        gen.dispatch(ActionSymbol::Declare);
        let v = interner.intern("v");
        gen.dispatch(ActionSymbol::Ptype(Token::new(TokenKind::Keyword, "void", 1)));
        let decl_tok = Token::with_symbol(TokenKind::Id, "v", 1, v);
        gen.dispatch(ActionSymbol::DeclareId(decl_tok.clone()));
        gen.dispatch(ActionSymbol::Pop);
        gen.dispatch(ActionSymbol::Pid(decl_tok));
        gen.dispatch(ActionSymbol::OpPush(Token::new(TokenKind::Symbol, "+", 2)));
        gen.dispatch(ActionSymbol::Pnum(Token::new(TokenKind::Num, "1", 2)));
        gen.dispatch(ActionSymbol::OpExec(2));
        assert!(gen.has_semantic_errors());
        assert_eq!(gen.semantic_errors().diagnostics()[0].message, "Type mismatch in operands, Got void instead of int.");
    }

    #[test]
    fn exec_main_without_main_declared_emits_semantic_error() {
        let arena = bumpalo::Bump::new();
        let mut interner = cminus_util::Interner::new(&arena);
        let output = interner.intern("output");
        let main = interner.intern("main");
        let mut gen = CodeGenerator::new(CodegenConfig::default(), output);
        gen.exec_main(main, 10);
        assert!(gen.has_semantic_errors());
        assert_eq!(gen.semantic_errors().diagnostics()[0].message, "'main' is not defined.");
    }

    #[test]
    fn break_outside_repeat_emits_semantic_error() {
        let arena = bumpalo::Bump::new();
        let mut interner = cminus_util::Interner::new(&arena);
        let output = interner.intern("output");
        let mut gen = CodeGenerator::new(CodegenConfig::default(), output);
        gen.dispatch(ActionSymbol::CheckInContainer(7));
        assert!(gen.has_semantic_errors());
        assert_eq!(gen.semantic_errors().diagnostics()[0].message, "No 'repeat ... until' found for 'break'.");
    }

    // §8 balance law: semantic-stack depth at the end of a completed
    // derivation equals its depth before entry plus its declared net
    // effect. `expression`'s chain of `pnum (op_push pnum op_exec)*`
    // declares a net effect of exactly one value left on the stack
    // regardless of chain length, since each `op_push`/`pnum`/`op_exec`
    // triple is net-zero (`op_push` +1, `pnum` +1, `op_exec` pops 3 pushes
    // 1 for -2).
    proptest! {
        #[test]
        fn expression_chain_leaves_exactly_one_value_on_the_stack(
            first in 0i64..1000,
            rest in proptest::collection::vec(
                (prop_oneof![Just("+"), Just("-"), Just("*"), Just("<"), Just("==")], 0i64..1000),
                0..8,
            ),
        ) {
            let arena = bumpalo::Bump::new();
            let mut interner = cminus_util::Interner::new(&arena);
            let output = interner.intern("output");
            let mut gen = CodeGenerator::new(CodegenConfig::default(), output);

            let first_lexeme = first.to_string();
            gen.dispatch(ActionSymbol::Pnum(Token::new(TokenKind::Num, &first_lexeme, 1)));

            for (op_lexeme, operand) in &rest {
                gen.dispatch(ActionSymbol::OpPush(Token::new(TokenKind::Symbol, op_lexeme, 1)));
                let operand_lexeme = operand.to_string();
                gen.dispatch(ActionSymbol::Pnum(Token::new(TokenKind::Num, &operand_lexeme, 1)));
                gen.dispatch(ActionSymbol::OpExec(1));
            }

            prop_assert!(!gen.has_semantic_errors());
            prop_assert_eq!(gen.ss.length(), 1);
        }
    }
}
