//! Pseudonym Pools

use rand::seq::IndexedRandom;
use rand::Rng;

/// Given names used for synthetic records
pub const FIRST_NAMES: [&str; 30] = [
    "Ana", "Beatriz", "Camila", "Daniela", "Eduarda", "Fernanda", "Gabriela", "Helena",
    "Isabela", "Juliana", "Larissa", "Mariana", "Natália", "Patrícia", "Rafaela",
    "Bruno", "Carlos", "Diego", "Eduardo", "Felipe", "Gustavo", "Henrique", "João",
    "Lucas", "Marcelo", "Otávio", "Pedro", "Rafael", "Thiago", "Vinícius",
];

/// Family names used for synthetic records
pub const LAST_NAMES: [&str; 20] = [
    "Silva", "Santos", "Oliveira", "Souza", "Rodrigues", "Ferreira", "Alves", "Pereira",
    "Lima", "Gomes", "Costa", "Ribeiro", "Martins", "Carvalho", "Almeida", "Lopes",
    "Soares", "Fernandes", "Vieira", "Barbosa",
];

/// Draw a "First Last" display name, first name then last name
pub fn random_pseudonym<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Pessoa");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Anônima");
    format!("{first} {last}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_pseudonym_comes_from_pools() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let name = random_pseudonym(&mut rng);
            let (first, last) = name.split_once(' ').unwrap();
            assert!(FIRST_NAMES.contains(&first));
            assert!(LAST_NAMES.contains(&last));
        }
    }

    #[test]
    fn test_pseudonym_is_seeded() {
        let a = random_pseudonym(&mut StdRng::seed_from_u64(1));
        let b = random_pseudonym(&mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }
}
