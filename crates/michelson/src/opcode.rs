//! Michelson primitive opcodes.

use core::fmt;

/// A Michelson primitive opcode as it appears in forged and compact binary.
///
/// Opcodes outside the known table still round-trip through the binary codecs, but cannot be
/// rendered to JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpCode(u8);

static NAMES: [&str; 157] = [
    "parameter",
    "storage",
    "code",
    "False",
    "Elt",
    "Left",
    "None",
    "Pair",
    "Right",
    "Some",
    "True",
    "Unit",
    "PACK",
    "UNPACK",
    "BLAKE2B",
    "SHA256",
    "SHA512",
    "ABS",
    "ADD",
    "AMOUNT",
    "AND",
    "BALANCE",
    "CAR",
    "CDR",
    "CHECK_SIGNATURE",
    "COMPARE",
    "CONCAT",
    "CONS",
    "CREATE_ACCOUNT",
    "CREATE_CONTRACT",
    "IMPLICIT_ACCOUNT",
    "DIP",
    "DROP",
    "DUP",
    "EDIV",
    "EMPTY_MAP",
    "EMPTY_SET",
    "EQ",
    "EXEC",
    "FAILWITH",
    "GE",
    "GET",
    "GT",
    "HASH_KEY",
    "IF",
    "IF_CONS",
    "IF_LEFT",
    "IF_NONE",
    "INT",
    "LAMBDA",
    "LE",
    "LEFT",
    "LOOP",
    "LSL",
    "LSR",
    "LT",
    "MAP",
    "MEM",
    "MUL",
    "NEG",
    "NEQ",
    "NIL",
    "NONE",
    "NOT",
    "NOW",
    "OR",
    "PAIR",
    "PUSH",
    "RIGHT",
    "SIZE",
    "SOME",
    "SOURCE",
    "SENDER",
    "SELF",
    "STEPS_TO_QUOTA",
    "SUB",
    "SWAP",
    "TRANSFER_TOKENS",
    "SET_DELEGATE",
    "UNIT",
    "UPDATE",
    "XOR",
    "ITER",
    "LOOP_LEFT",
    "ADDRESS",
    "CONTRACT",
    "ISNAT",
    "CAST",
    "RENAME",
    "bool",
    "contract",
    "int",
    "key",
    "key_hash",
    "lambda",
    "list",
    "map",
    "big_map",
    "nat",
    "option",
    "or",
    "pair",
    "set",
    "signature",
    "string",
    "bytes",
    "mutez",
    "timestamp",
    "unit",
    "operation",
    "address",
    "SLICE",
    "DIG",
    "DUG",
    "EMPTY_BIG_MAP",
    "APPLY",
    "chain_id",
    "CHAIN_ID",
    "LEVEL",
    "SELF_ADDRESS",
    "never",
    "NEVER",
    "UNPAIR",
    "VOTING_POWER",
    "TOTAL_VOTING_POWER",
    "KECCAK",
    "SHA3",
    "PAIRING_CHECK",
    "bls12_381_g1",
    "bls12_381_g2",
    "bls12_381_fr",
    "sapling_state",
    "sapling_transaction_deprecated",
    "SAPLING_EMPTY_STATE",
    "SAPLING_VERIFY_UPDATE",
    "ticket",
    "TICKET_DEPRECATED",
    "READ_TICKET",
    "SPLIT_TICKET",
    "JOIN_TICKETS",
    "GET_AND_UPDATE",
    "chest",
    "chest_key",
    "OPEN_CHEST",
    "VIEW",
    "view",
    "constant",
    "SUB_MUTEZ",
    "tx_rollup_l2_address",
    "MIN_BLOCK_TIME",
    "sapling_transaction",
    "EMIT",
    "Lambda_rec",
    "LAMBDA_REC",
    "TICKET",
    "BYTES",
    "NAT",
];

impl OpCode {
    /// `parameter` section keyword.
    pub const K_PARAMETER: Self = Self(0);
    /// `storage` section keyword.
    pub const K_STORAGE: Self = Self(1);
    /// `code` section keyword.
    pub const K_CODE: Self = Self(2);
    /// `False` data constructor.
    pub const D_FALSE: Self = Self(3);
    /// `Elt` data constructor.
    pub const D_ELT: Self = Self(4);
    /// `Left` data constructor.
    pub const D_LEFT: Self = Self(5);
    /// `None` data constructor.
    pub const D_NONE: Self = Self(6);
    /// `Pair` data constructor.
    pub const D_PAIR: Self = Self(7);
    /// `Right` data constructor.
    pub const D_RIGHT: Self = Self(8);
    /// `Some` data constructor.
    pub const D_SOME: Self = Self(9);
    /// `True` data constructor.
    pub const D_TRUE: Self = Self(10);
    /// `Unit` data constructor.
    pub const D_UNIT: Self = Self(11);
    /// `DROP` instruction.
    pub const I_DROP: Self = Self(32);
    /// `NIL` instruction.
    pub const I_NIL: Self = Self(61);
    /// `bool` type.
    pub const T_BOOL: Self = Self(89);
    /// `contract` type.
    pub const T_CONTRACT: Self = Self(90);
    /// `int` type.
    pub const T_INT: Self = Self(91);
    /// `key` type.
    pub const T_KEY: Self = Self(92);
    /// `key_hash` type.
    pub const T_KEY_HASH: Self = Self(93);
    /// `lambda` type.
    pub const T_LAMBDA: Self = Self(94);
    /// `list` type.
    pub const T_LIST: Self = Self(95);
    /// `map` type.
    pub const T_MAP: Self = Self(96);
    /// `big_map` type.
    pub const T_BIG_MAP: Self = Self(97);
    /// `nat` type.
    pub const T_NAT: Self = Self(98);
    /// `option` type.
    pub const T_OPTION: Self = Self(99);
    /// `or` type.
    pub const T_OR: Self = Self(100);
    /// `pair` type.
    pub const T_PAIR: Self = Self(101);
    /// `set` type.
    pub const T_SET: Self = Self(102);
    /// `signature` type.
    pub const T_SIGNATURE: Self = Self(103);
    /// `string` type.
    pub const T_STRING: Self = Self(104);
    /// `bytes` type.
    pub const T_BYTES: Self = Self(105);
    /// `mutez` type.
    pub const T_MUTEZ: Self = Self(106);
    /// `timestamp` type.
    pub const T_TIMESTAMP: Self = Self(107);
    /// `unit` type.
    pub const T_UNIT: Self = Self(108);
    /// `operation` type.
    pub const T_OPERATION: Self = Self(109);
    /// `address` type.
    pub const T_ADDRESS: Self = Self(110);

    /// Wraps a raw opcode byte.
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// Returns the raw opcode byte.
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Returns the primitive name, if the opcode is known.
    pub fn name(self) -> Option<&'static str> {
        NAMES.get(usize::from(self.0)).copied()
    }

    /// Looks up an opcode by primitive name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        NAMES.iter().position(|&n| n == name).and_then(|i| u8::try_from(i).ok()).map(Self)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:02x}", self.0),
        }
    }
}
