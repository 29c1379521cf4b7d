/// 상품 레지스트리
/// 기동 시 시드로 한 번 채워지고 이후 키 집합이 고정되는 상품 소유자.
// region:    --- Imports
use crate::auction::item::{AuctionItem, ItemSeed};
use crate::clock::Clock;
use crate::notifier::NotificationSink;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Auction Registry

pub struct AuctionRegistry {
    items: HashMap<String, Arc<AuctionItem>>,
    /// 목록 조회 순서 (시드 순서 유지)
    order: Vec<String>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
}

impl AuctionRegistry {
    /// 시드와 협력자(시계, 알림 싱크)로 레지스트리 생성
    pub fn new(
        seeds: Vec<ItemSeed>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let now = clock.now();
        let mut items = HashMap::with_capacity(seeds.len());
        let mut order = Vec::with_capacity(seeds.len());

        for seed in seeds {
            if items.contains_key(&seed.id) {
                warn!("{:<12} --> 중복 시드 id 무시: {}", "Registry", seed.id);
                continue;
            }
            let id = seed.id.clone();
            items.insert(id.clone(), Arc::new(AuctionItem::new(seed, now)));
            order.push(id);
        }

        info!("{:<12} --> 경매 상품 {}개 초기화 완료", "Registry", order.len());
        Self {
            items,
            order,
            clock,
            sink,
        }
    }

    /// 상품 조회
    pub fn get(&self, item_id: &str) -> Option<&Arc<AuctionItem>> {
        self.items.get(item_id)
    }

    /// 시드 순서대로 상품 순회
    pub fn iter(&self) -> impl Iterator<Item = &Arc<AuctionItem>> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn sink(&self) -> &dyn NotificationSink {
        self.sink.as_ref()
    }
}

// endregion: --- Auction Registry
