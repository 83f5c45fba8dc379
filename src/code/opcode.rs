//! Dalvik opcode metadata.
//!
//! The analysis never interprets an instruction; all it needs from an opcode is
//! its mnemonic (for diagnostics and graph labels) and a handful of behavioural
//! flags. [`Opcode`] carries exactly that. The constants below cover the
//! opcodes exercised by the crate's tests and benchmarks; callers with a full
//! decoder construct further opcodes with [`Opcode::new`].

use std::fmt;

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Behavioural flags of a Dalvik opcode
    pub struct OpcodeFlags: u8 {
        /// The instruction may raise an exception
        const CAN_THROW = 0x01;
        /// Execution may continue with the next instruction
        const CAN_CONTINUE = 0x02;
        /// The instruction writes its first register operand
        const SETS_REGISTER = 0x04;
        /// The instruction leaves a value for a following `move-result`
        const SETS_RESULT = 0x08;
        /// The instruction writes a register pair
        const SETS_WIDE_REGISTER = 0x10;
    }
}

/// Opcode metadata: raw value, mnemonic and behavioural flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    /// Raw opcode byte
    pub value: u16,
    /// Smali mnemonic
    pub name: &'static str,
    /// Behavioural flags
    pub flags: OpcodeFlags,
}

const T: OpcodeFlags = OpcodeFlags::CAN_THROW;
const C: OpcodeFlags = OpcodeFlags::CAN_CONTINUE;
const R: OpcodeFlags = OpcodeFlags::SETS_REGISTER;
const S: OpcodeFlags = OpcodeFlags::SETS_RESULT;
const W: OpcodeFlags = OpcodeFlags::SETS_WIDE_REGISTER;

impl Opcode {
    /// Creates opcode metadata.
    #[must_use]
    pub const fn new(value: u16, name: &'static str, flags: OpcodeFlags) -> Self {
        Opcode { value, name, flags }
    }

    /// Returns `true` if the instruction may raise an exception.
    #[must_use]
    pub const fn can_throw(&self) -> bool {
        self.flags.contains(OpcodeFlags::CAN_THROW)
    }

    /// Returns `true` if the instruction defines its destination register.
    #[must_use]
    pub const fn sets_register(&self) -> bool {
        self.flags.contains(OpcodeFlags::SETS_REGISTER)
    }

    /// Returns `true` if execution may fall through to the next instruction.
    #[must_use]
    pub const fn can_continue(&self) -> bool {
        self.flags.contains(OpcodeFlags::CAN_CONTINUE)
    }

    /// Looks up one of the predefined opcodes by mnemonic.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Opcode> {
        Self::KNOWN.iter().copied().find(|op| op.name == name)
    }

    /// `nop`
    pub const NOP: Opcode = Opcode::new(0x00, "nop", C);
    /// `move`
    pub const MOVE: Opcode = Opcode::new(0x01, "move", C.union(R));
    /// `move-wide`
    pub const MOVE_WIDE: Opcode = Opcode::new(0x04, "move-wide", C.union(R).union(W));
    /// `move-object`
    pub const MOVE_OBJECT: Opcode = Opcode::new(0x07, "move-object", C.union(R));
    /// `move-result`
    pub const MOVE_RESULT: Opcode = Opcode::new(0x0a, "move-result", C.union(R));
    /// `move-result-object`
    pub const MOVE_RESULT_OBJECT: Opcode = Opcode::new(0x0c, "move-result-object", C.union(R));
    /// `move-exception`
    pub const MOVE_EXCEPTION: Opcode = Opcode::new(0x0d, "move-exception", C.union(R));
    /// `return-void`
    pub const RETURN_VOID: Opcode = Opcode::new(0x0e, "return-void", OpcodeFlags::empty());
    /// `return`
    pub const RETURN: Opcode = Opcode::new(0x0f, "return", OpcodeFlags::empty());
    /// `return-object`
    pub const RETURN_OBJECT: Opcode = Opcode::new(0x11, "return-object", OpcodeFlags::empty());
    /// `const/4`
    pub const CONST_4: Opcode = Opcode::new(0x12, "const/4", C.union(R));
    /// `const/16`
    pub const CONST_16: Opcode = Opcode::new(0x13, "const/16", C.union(R));
    /// `const-string`
    pub const CONST_STRING: Opcode = Opcode::new(0x1a, "const-string", T.union(C).union(R));
    /// `check-cast`
    pub const CHECK_CAST: Opcode = Opcode::new(0x1f, "check-cast", T.union(C).union(R));
    /// `array-length`
    pub const ARRAY_LENGTH: Opcode = Opcode::new(0x21, "array-length", T.union(C).union(R));
    /// `new-instance`
    pub const NEW_INSTANCE: Opcode = Opcode::new(0x22, "new-instance", T.union(C).union(R));
    /// `throw`
    pub const THROW: Opcode = Opcode::new(0x27, "throw", T);
    /// `goto`
    pub const GOTO: Opcode = Opcode::new(0x28, "goto", OpcodeFlags::empty());
    /// `packed-switch`
    pub const PACKED_SWITCH: Opcode = Opcode::new(0x2b, "packed-switch", C);
    /// `if-eq`
    pub const IF_EQ: Opcode = Opcode::new(0x32, "if-eq", C);
    /// `if-ne`
    pub const IF_NE: Opcode = Opcode::new(0x33, "if-ne", C);
    /// `if-lt`
    pub const IF_LT: Opcode = Opcode::new(0x34, "if-lt", C);
    /// `if-eqz`
    pub const IF_EQZ: Opcode = Opcode::new(0x38, "if-eqz", C);
    /// `if-nez`
    pub const IF_NEZ: Opcode = Opcode::new(0x39, "if-nez", C);
    /// `aget`
    pub const AGET: Opcode = Opcode::new(0x44, "aget", T.union(C).union(R));
    /// `aput`
    pub const APUT: Opcode = Opcode::new(0x4b, "aput", T.union(C));
    /// `iget`
    pub const IGET: Opcode = Opcode::new(0x52, "iget", T.union(C).union(R));
    /// `iput`
    pub const IPUT: Opcode = Opcode::new(0x59, "iput", T.union(C));
    /// `sget`
    pub const SGET: Opcode = Opcode::new(0x60, "sget", T.union(C).union(R));
    /// `sput`
    pub const SPUT: Opcode = Opcode::new(0x67, "sput", T.union(C));
    /// `invoke-virtual`
    pub const INVOKE_VIRTUAL: Opcode = Opcode::new(0x6e, "invoke-virtual", T.union(C).union(S));
    /// `invoke-direct`
    pub const INVOKE_DIRECT: Opcode = Opcode::new(0x70, "invoke-direct", T.union(C).union(S));
    /// `invoke-static`
    pub const INVOKE_STATIC: Opcode = Opcode::new(0x71, "invoke-static", T.union(C).union(S));
    /// `add-int`
    pub const ADD_INT: Opcode = Opcode::new(0x90, "add-int", C.union(R));
    /// `sub-int`
    pub const SUB_INT: Opcode = Opcode::new(0x91, "sub-int", C.union(R));
    /// `mul-int`
    pub const MUL_INT: Opcode = Opcode::new(0x92, "mul-int", C.union(R));
    /// `div-int`
    pub const DIV_INT: Opcode = Opcode::new(0x93, "div-int", T.union(C).union(R));
    /// `add-int/2addr`
    pub const ADD_INT_2ADDR: Opcode = Opcode::new(0xb0, "add-int/2addr", C.union(R));
    /// `add-int/lit8`
    pub const ADD_INT_LIT8: Opcode = Opcode::new(0xd8, "add-int/lit8", C.union(R));

    const KNOWN: &'static [Opcode] = &[
        Self::NOP,
        Self::MOVE,
        Self::MOVE_WIDE,
        Self::MOVE_OBJECT,
        Self::MOVE_RESULT,
        Self::MOVE_RESULT_OBJECT,
        Self::MOVE_EXCEPTION,
        Self::RETURN_VOID,
        Self::RETURN,
        Self::RETURN_OBJECT,
        Self::CONST_4,
        Self::CONST_16,
        Self::CONST_STRING,
        Self::CHECK_CAST,
        Self::ARRAY_LENGTH,
        Self::NEW_INSTANCE,
        Self::THROW,
        Self::GOTO,
        Self::PACKED_SWITCH,
        Self::IF_EQ,
        Self::IF_NE,
        Self::IF_LT,
        Self::IF_EQZ,
        Self::IF_NEZ,
        Self::AGET,
        Self::APUT,
        Self::IGET,
        Self::IPUT,
        Self::SGET,
        Self::SPUT,
        Self::INVOKE_VIRTUAL,
        Self::INVOKE_DIRECT,
        Self::INVOKE_STATIC,
        Self::ADD_INT,
        Self::SUB_INT,
        Self::MUL_INT,
        Self::DIV_INT,
        Self::ADD_INT_2ADDR,
        Self::ADD_INT_LIT8,
    ];
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
