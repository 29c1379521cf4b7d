/// 데모 경매 상품 시드 카탈로그
use crate::auction::item::ItemSeed;

/// 기동 시 레지스트리에 1회 주입되는 샘플 상품 목록
pub fn sample_items() -> Vec<ItemSeed> {
    vec![
        ItemSeed {
            id: "1".to_string(),
            title: "Vintage Rolex Watch".to_string(),
            description: "Rare 1960s Rolex Submariner in excellent condition".to_string(),
            starting_price: 5000,
            image_url: "https://images.unsplash.com/photo-1523170335258-f5ed11844a49?w=400"
                .to_string(),
            duration_minutes: 5,
        },
        ItemSeed {
            id: "2".to_string(),
            title: "MacBook Pro M3 Max".to_string(),
            description: "Latest MacBook Pro with M3 Max chip, 64GB RAM".to_string(),
            starting_price: 3000,
            image_url: "https://images.unsplash.com/photo-1517336714731-489689fd1ca8?w=400"
                .to_string(),
            duration_minutes: 5,
        },
        ItemSeed {
            id: "3".to_string(),
            title: "Rare Pokémon Card Set".to_string(),
            description: "Complete first edition holographic set".to_string(),
            starting_price: 1500,
            image_url: "https://images.unsplash.com/photo-1613771404721-1f92d799e49f?w=400"
                .to_string(),
            duration_minutes: 5,
        },
        ItemSeed {
            id: "4".to_string(),
            title: "Gibson Les Paul Guitar".to_string(),
            description: "1959 Gibson Les Paul Standard - Sunburst".to_string(),
            starting_price: 8000,
            image_url: "https://images.unsplash.com/photo-1564186763535-ebb21ef5277f?w=400"
                .to_string(),
            duration_minutes: 5,
        },
        ItemSeed {
            id: "5".to_string(),
            title: "Sony A7R V Camera".to_string(),
            description: "Professional full-frame mirrorless camera with lens".to_string(),
            starting_price: 3500,
            image_url: "https://images.unsplash.com/photo-1502920917128-1aa500764cbd?w=400"
                .to_string(),
            duration_minutes: 5,
        },
        ItemSeed {
            id: "6".to_string(),
            title: "Limited Edition Sneakers".to_string(),
            description: "Nike Air Jordan 1 Retro High OG - Chicago".to_string(),
            starting_price: 800,
            image_url: "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=400"
                .to_string(),
            duration_minutes: 5,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_items_have_unique_ids_and_positive_prices() {
        let seeds = sample_items();
        assert_eq!(seeds.len(), 6);

        let ids: HashSet<_> = seeds.iter().map(|seed| seed.id.as_str()).collect();
        assert_eq!(ids.len(), seeds.len());

        for seed in &seeds {
            assert!(seed.starting_price > 0);
            assert!(seed.duration_minutes > 0);
        }
    }
}
