#[cfg(test)]
mod tests {
    use crate::script::opcode::{Opcode, StackEffect};

    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    const EXPECTED_OPCODE_TABLE_HASH: u64 = 3843248108224426554;

    fn fnv1a64(mut h: u64, bytes: &[u8]) -> u64 {
        for b in bytes {
            h ^= *b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        h
    }

    fn effect_bytes(effect: StackEffect) -> Vec<u8> {
        match effect {
            StackEffect::Fixed { pops, pushes } => vec![0, pops, pushes],
            StackEffect::Operand => vec![1],
            StackEffect::Opaque => vec![2],
        }
    }

    macro_rules! hash_opcodes {
        (
            $( $(#[$doc:meta])* $name:ident = $opcode:literal, $mnemonic:literal => $effect:expr ),* $(,)?
        ) => {{
            let mut h = FNV_OFFSET;
            $(
                h = fnv1a64(h, stringify!($name).as_bytes());
                h = fnv1a64(h, &[Opcode::$name as u8]);
                h = fnv1a64(h, $mnemonic.as_bytes());
                h = fnv1a64(h, &effect_bytes(Opcode::$name.stack_effect()));
            )*
            h
        }};
    }

    fn current_opcode_table_hash() -> u64 {
        crate::for_each_opcode!(hash_opcodes)
    }

    #[test]
    #[ignore]
    fn print_opcode_table_hash() {
        println!("OPCODE_TABLE_HASH={}", current_opcode_table_hash());
    }

    /// Deployed programs depend on these discriminants; a change here breaks them.
    #[test]
    fn opcode_table_hash_unchanged() {
        assert_eq!(current_opcode_table_hash(), EXPECTED_OPCODE_TABLE_HASH);
    }
}
