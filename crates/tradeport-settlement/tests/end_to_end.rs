//! End-to-end integration tests for the marketplace.
//!
//! These tests drive the public [`Marketplace`] API against an
//! [`InMemoryLedger`] host: signing orders off-line, fulfilling them singly,
//! in batches and through fulfill-available, and checking balances, order
//! status, events and native supply conservation afterwards.

use tradeport_settlement::{FixedClock, FixedEntropy, InMemoryLedger, Marketplace};
use tradeport_signing::testing::TestSigner;
use tradeport_types::*;

const NFT: Address = Address::repeat_byte(0xc0);
const TOKEN: Address = Address::repeat_byte(0xd0);
const FEE: Address = Address::repeat_byte(0xfe);
const ZONE: Address = Address::repeat_byte(0x20);

fn u(v: u64) -> U256 {
    U256::from(v)
}

/// Helper: a marketplace with one funded buyer and a controllable clock.
struct Scenario {
    market: Marketplace<InMemoryLedger, FixedClock, FixedEntropy>,
    clock: FixedClock,
    buyer: Address,
}

impl Scenario {
    fn new() -> Self {
        let config = MarketplaceConfig::default();
        let ledger = InMemoryLedger::new(config.verifying_contract);
        let clock = FixedClock::at(1_000);
        let mut entropy = [0u8; 32];
        entropy[15] = 0x07;
        let market = Marketplace::new(config, ledger, clock.clone(), FixedEntropy(B256::from(entropy)))
            .unwrap();
        let mut scenario = Self {
            market,
            clock,
            buyer: Address::repeat_byte(0xb0),
        };
        scenario.fund(scenario.buyer, 100);
        scenario
    }

    fn fund(&mut self, account: Address, amount: u64) {
        self.market.ledger_mut().mint_native(account, u(amount));
    }

    fn native(&self, account: Address) -> U256 {
        self.market.ledger().native_balance(account)
    }

    /// Mint `token_id` to the seller and approve the marketplace for it.
    fn give_nft(&mut self, seller: &TestSigner, token_id: u64) {
        let ledger = self.market.ledger_mut();
        ledger.mint_non_fungible(NFT, u(token_id), seller.address());
        ledger.set_approval(NFT, seller.address(), true);
    }

    /// The canonical listing: one NFT for 10 to the seller, 1 fee, 1 zone.
    fn listing_params(&mut self, seller: &TestSigner, token_id: u64) -> OrderParameters {
        self.give_nft(seller, token_id);
        OrderParameters::dummy(
            seller.address(),
            vec![OfferItem::non_fungible(NFT, u(token_id))],
            vec![
                ConsiderationItem::native(u(10), seller.address()),
                ConsiderationItem::native(u(1), FEE),
                ConsiderationItem::native(u(1), ZONE),
            ],
        )
        .with_zone(ZONE, OrderType::FullRestricted)
    }

    fn sign(&self, seller: &TestSigner, params: OrderParameters) -> Order {
        let counter = self.market.get_counter(seller.address());
        seller.sign_order(self.market.hasher(), params, counter)
    }

    fn listing(&mut self, seller: &TestSigner, token_id: u64) -> Order {
        let params = self.listing_params(seller, token_id);
        self.sign(seller, params)
    }

    fn hash_of(&self, order: &Order) -> OrderHash {
        let counter = self.market.get_counter(order.parameters.offerer);
        let components = order.parameters.to_components(counter).unwrap();
        self.market.get_order_hash(&components).unwrap()
    }
}

// =========================================================================
// Single-order fulfillment
// =========================================================================

#[test]
fn twelve_unit_listing_settles_all_parties() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let order = s.listing(&seller, 1);

    let receipt = s.market.fulfill_order(&order, u(12), s.buyer).unwrap();

    assert_eq!(s.native(seller.address()), u(10));
    assert_eq!(s.native(FEE), u(1));
    assert_eq!(s.native(ZONE), u(1));
    assert_eq!(s.native(s.buyer), u(88));
    assert_eq!(s.market.ledger().owner_of(NFT, u(1)), Some(s.buyer));

    assert_eq!(receipt.native_consumed, u(12));
    assert_eq!(receipt.native_refunded, U256::ZERO);
    assert_eq!(receipt.fulfilled_event_count(), 1);
    match &receipt.events[0] {
        MarketplaceEvent::OrderFulfilled {
            offerer,
            zone,
            recipient,
            offer,
            consideration,
            ..
        } => {
            assert_eq!(*offerer, seller.address());
            assert_eq!(*zone, ZONE);
            assert_eq!(*recipient, s.buyer);
            assert_eq!(offer.len(), 1);
            assert_eq!(consideration.len(), 3);
        }
        other => panic!("unexpected event {other}"),
    }
    s.market.ledger().verify_native_supply().unwrap();
}

#[test]
fn eleven_units_is_insufficient() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let order = s.listing(&seller, 1);

    let err = s.market.fulfill_order(&order, u(11), s.buyer).unwrap_err();
    assert_eq!(
        err,
        TradeportError::InsufficientNativeTokensSupplied {
            required: u(12),
            supplied: u(11),
        }
    );
    assert_eq!(s.native(s.buyer), u(100));
    assert_eq!(s.market.ledger().owner_of(NFT, u(1)), Some(seller.address()));
    assert!(s.market.events().is_empty());
}

#[test]
fn surplus_value_is_refunded() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let order = s.listing(&seller, 1);

    let receipt = s.market.fulfill_order(&order, u(20), s.buyer).unwrap();
    assert_eq!(receipt.native_refunded, u(8));
    assert_eq!(s.native(s.buyer), u(88));
    assert_eq!(s.native(s.market.config().verifying_contract), U256::ZERO);
}

#[test]
fn descending_price_refunds_difference_to_max() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    s.give_nft(&seller, 1);
    let mut price = ConsiderationItem::native(u(12), seller.address());
    price.end_amount = u(8);
    let params = OrderParameters::dummy(
        seller.address(),
        vec![OfferItem::non_fungible(NFT, u(1))],
        vec![price],
    )
    .with_window(u(1_000), u(1_100));
    let order = s.sign(&seller, params);

    s.clock.advance(50);
    let receipt = s.market.fulfill_order(&order, u(12), s.buyer).unwrap();
    assert_eq!(receipt.native_consumed, u(10));
    assert_eq!(receipt.native_refunded, u(2));
    assert_eq!(s.native(seller.address()), u(10));
}

#[test]
fn ascending_price_over_default_window_settles() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    s.give_nft(&seller, 1);
    let mut price = ConsiderationItem::native(u(10), seller.address());
    price.end_amount = u(20);
    let params = OrderParameters::dummy(
        seller.address(),
        vec![OfferItem::non_fungible(NFT, u(1))],
        vec![price],
    );
    assert_eq!(params.end_time, U256::MAX);
    let order = s.sign(&seller, params);

    let receipt = s.market.fulfill_order(&order, u(20), s.buyer).unwrap();
    assert_eq!(receipt.native_consumed, u(11));
    assert_eq!(receipt.native_refunded, u(9));
    assert_eq!(s.market.ledger().owner_of(NFT, u(1)), Some(s.buyer));
    s.market.ledger().verify_native_supply().unwrap();
}

#[test]
fn compact_signature_accepted() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(3);
    let params = s.listing_params(&seller, 1);
    let order = seller.sign_order_compact(s.market.hasher(), params, U256::ZERO);
    assert_eq!(order.signature.len(), 64);

    s.market.fulfill_order(&order, u(12), s.buyer).unwrap();
    assert_eq!(s.market.ledger().owner_of(NFT, u(1)), Some(s.buyer));
}

#[test]
fn fungible_payment_and_tip() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    s.give_nft(&seller, 1);
    let ledger = s.market.ledger_mut();
    ledger.mint_fungible(TOKEN, s.buyer, u(500));
    ledger.set_approval(TOKEN, s.buyer, true);

    let params = OrderParameters::dummy(
        seller.address(),
        vec![OfferItem::non_fungible(NFT, u(1))],
        vec![ConsiderationItem::fungible(TOKEN, u(300), seller.address())],
    );
    let mut order = s.sign(&seller, params);
    // Tips ride outside the signed consideration.
    order
        .parameters
        .consideration
        .push(ConsiderationItem::fungible(TOKEN, u(5), FEE));

    s.market.fulfill_order(&order, U256::ZERO, s.buyer).unwrap();
    let ledger = s.market.ledger();
    assert_eq!(ledger.fungible_balance(TOKEN, seller.address()), u(300));
    assert_eq!(ledger.fungible_balance(TOKEN, FEE), u(5));
    assert_eq!(ledger.fungible_balance(TOKEN, s.buyer), u(195));
}

#[test]
fn missing_original_consideration_rejected() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let mut order = s.listing(&seller, 1);
    order.parameters.consideration.pop();

    let err = s.market.fulfill_order(&order, u(12), s.buyer).unwrap_err();
    assert_eq!(
        err,
        TradeportError::MissingOriginalConsiderationItems {
            expected: 3,
            actual: 2,
        }
    );
}

// =========================================================================
// Order lifecycle
// =========================================================================

#[test]
fn order_fills_only_once() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let order = s.listing(&seller, 1);
    let hash = s.hash_of(&order);

    s.market.fulfill_order(&order, u(12), s.buyer).unwrap();
    let err = s.market.fulfill_order(&order, u(12), s.buyer).unwrap_err();
    assert_eq!(err, TradeportError::OrderAlreadyFilled(hash));
    assert_eq!(s.market.get_order_status(&hash).state(), OrderState::Fulfilled);
}

#[test]
fn cancellation_takes_precedence() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let order = s.listing(&seller, 1);
    let components = order.parameters.to_components(U256::ZERO).unwrap();

    s.market.fulfill_order(&order, u(12), s.buyer).unwrap();
    let hashes = s.market.cancel(&[components], seller.address()).unwrap();

    let err = s.market.fulfill_order(&order, u(12), s.buyer).unwrap_err();
    assert_eq!(err, TradeportError::OrderIsCancelled(hashes[0]));
    assert_eq!(
        s.market.get_order_status(&hashes[0]).state(),
        OrderState::Cancelled
    );
}

#[test]
fn only_offerer_or_zone_may_cancel() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let order = s.listing(&seller, 1);
    let components = order.parameters.to_components(U256::ZERO).unwrap();

    assert_eq!(
        s.market.cancel(&[components.clone()], s.buyer).unwrap_err(),
        TradeportError::CannotCancelOrder
    );
    s.market.cancel(&[components], ZONE).unwrap();
    assert!(matches!(
        s.market.fulfill_order(&order, u(12), s.buyer),
        Err(TradeportError::OrderIsCancelled(_))
    ));
}

#[test]
fn counter_increment_invalidates_signed_orders() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let order = s.listing(&seller, 1);

    let new_counter = s.market.increment_counter(seller.address()).unwrap();
    assert_eq!(new_counter, u(7));
    assert_eq!(s.market.get_counter(seller.address()), u(7));

    let err = s.market.fulfill_order(&order, u(12), s.buyer).unwrap_err();
    assert!(matches!(err, TradeportError::InvalidSigner { .. }));

    // Re-signing under the new counter works again.
    let resigned = s.sign(&seller, order.parameters.clone());
    s.market.fulfill_order(&resigned, u(12), s.buyer).unwrap();
}

#[test]
fn time_window_enforced() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let params = s.listing_params(&seller, 1).with_window(u(2_000), u(3_000));
    let order = s.sign(&seller, params);

    let early = s.market.fulfill_order(&order, u(12), s.buyer).unwrap_err();
    assert_eq!(
        early,
        TradeportError::InvalidTime {
            start_time: u(2_000),
            end_time: u(3_000),
        }
    );

    s.clock.set(3_000);
    assert!(matches!(
        s.market.fulfill_order(&order, u(12), s.buyer),
        Err(TradeportError::InvalidTime { .. })
    ));

    s.clock.set(2_000);
    s.market.fulfill_order(&order, u(12), s.buyer).unwrap();
}

#[test]
fn validated_order_needs_no_signature() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let order = s.listing(&seller, 1);
    let hashes = s.market.validate(&[order.clone()], s.buyer).unwrap();
    assert_eq!(
        s.market.get_order_status(&hashes[0]).state(),
        OrderState::Validated
    );

    let unsigned = Order::new(order.parameters, Bytes::new());
    s.market.fulfill_order(&unsigned, u(12), s.buyer).unwrap();
}

#[test]
fn validate_rejects_foreign_signature() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let params = s.listing_params(&seller, 1);
    let forged = TestSigner::from_seed(2).sign_order(s.market.hasher(), params, U256::ZERO);

    let err = s.market.validate(&[forged], s.buyer).unwrap_err();
    assert!(matches!(err, TradeportError::InvalidSigner { .. }));
    assert!(s.market.registry().is_empty());
}

#[test]
fn transfer_failure_rolls_back_everything() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let order = s.listing(&seller, 1);
    s.market
        .ledger_mut()
        .set_approval(NFT, seller.address(), false);

    let err = s.market.fulfill_order(&order, u(12), s.buyer).unwrap_err();
    assert!(matches!(
        err,
        TradeportError::Transfer(TransferError::NotApproved { .. })
    ));
    assert_eq!(s.native(s.buyer), u(100));
    assert_eq!(s.native(seller.address()), U256::ZERO);
    assert!(s.market.get_order_status(&s.hash_of(&order)).is_open());
    assert!(s.market.events().is_empty());
    s.market.ledger().verify_native_supply().unwrap();
}

// =========================================================================
// Batch fulfillment
// =========================================================================

#[test]
fn batch_skips_expired_and_fills_valid() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let expired_params = s.listing_params(&seller, 1).with_window(u(0), u(500));
    let expired = s.sign(&seller, expired_params);
    let valid = s.listing(&seller, 2);

    let receipt = s
        .market
        .fulfill_order_batch(&[expired, valid], u(12), s.buyer)
        .unwrap();

    assert_eq!(receipt.fulfilled_event_count(), 1);
    assert_eq!(receipt.skipped.len(), 1);
    assert_eq!(receipt.skipped[0].index, 0);
    assert_eq!(s.market.ledger().owner_of(NFT, u(1)), Some(seller.address()));
    assert_eq!(s.market.ledger().owner_of(NFT, u(2)), Some(s.buyer));
}

#[test]
fn batch_skips_order_with_unrepresentable_amounts() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let mut broken_params = s.listing_params(&seller, 1);
    broken_params.consideration[0].start_amount = U256::MAX;
    broken_params.consideration[0].end_amount = U256::MAX;
    let broken = s.sign(&seller, broken_params);
    let valid = s.listing(&seller, 2);

    let receipt = s
        .market
        .fulfill_order_batch(&[broken, valid], u(12), s.buyer)
        .unwrap();

    assert_eq!(receipt.fulfilled_event_count(), 1);
    assert_eq!(receipt.skipped.len(), 1);
    assert_eq!(receipt.skipped[0].index, 0);
    assert!(receipt.skipped[0].reason.starts_with("TP_ERR_207"));
    assert_eq!(s.market.ledger().owner_of(NFT, u(2)), Some(s.buyer));
}

#[test]
fn batch_checks_summed_value_once() {
    let mut s = Scenario::new();
    let alice = TestSigner::from_seed(1);
    let bob = TestSigner::from_seed(2);
    let orders = [s.listing(&alice, 1), s.listing(&bob, 2)];

    let err = s
        .market
        .fulfill_order_batch(&orders, u(23), s.buyer)
        .unwrap_err();
    assert_eq!(
        err,
        TradeportError::InsufficientNativeTokensSupplied {
            required: u(24),
            supplied: u(23),
        }
    );

    let receipt = s.market.fulfill_order_batch(&orders, u(24), s.buyer).unwrap();
    assert_eq!(receipt.fulfilled.len(), 2);
    assert_eq!(s.native(FEE), u(2));
}

#[test]
fn batch_transfer_failure_is_fatal() {
    let mut s = Scenario::new();
    let alice = TestSigner::from_seed(1);
    let bob = TestSigner::from_seed(2);
    let orders = [s.listing(&alice, 1), s.listing(&bob, 2)];
    s.market.ledger_mut().set_approval(NFT, bob.address(), false);

    let err = s
        .market
        .fulfill_order_batch(&orders, u(24), s.buyer)
        .unwrap_err();
    assert!(matches!(err, TradeportError::Transfer(_)));
    assert_eq!(s.market.ledger().owner_of(NFT, u(1)), Some(alice.address()));
    assert_eq!(s.native(s.buyer), u(100));
}

#[test]
fn batch_with_nothing_fulfillable_refunds_everything() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let params = s.listing_params(&seller, 1).with_window(u(0), u(1));
    let expired = s.sign(&seller, params);

    let receipt = s.market.fulfill_order_batch(&[expired], u(12), s.buyer).unwrap();
    assert!(receipt.fulfilled.is_empty());
    assert_eq!(receipt.native_refunded, u(12));
    assert_eq!(s.native(s.buyer), u(100));
}

// =========================================================================
// Fulfill-available
// =========================================================================

fn fc(order_index: usize, item_index: usize) -> FulfillmentComponent {
    FulfillmentComponent::new(order_index, item_index)
}

#[test]
fn fulfill_available_nets_shared_recipients() {
    let mut s = Scenario::new();
    let alice = TestSigner::from_seed(1);
    let bob = TestSigner::from_seed(2);
    let orders = [s.listing(&alice, 1), s.listing(&bob, 2)];

    let receipt = s
        .market
        .fulfill_available_orders(
            &orders,
            &[vec![fc(0, 0)], vec![fc(1, 0)]],
            &[
                vec![fc(0, 0)],
                vec![fc(1, 0)],
                vec![fc(0, 1), fc(1, 1)],
                vec![fc(0, 2), fc(1, 2)],
            ],
            2,
            u(30),
            s.buyer,
        )
        .unwrap();

    assert_eq!(receipt.fulfilled.len(), 2);
    assert_eq!(receipt.native_refunded, u(6));
    assert_eq!(s.native(alice.address()), u(10));
    assert_eq!(s.native(bob.address()), u(10));
    assert_eq!(s.native(FEE), u(2));
    assert_eq!(s.native(ZONE), u(2));
    assert_eq!(s.market.ledger().owner_of(NFT, u(2)), Some(s.buyer));
    s.market.ledger().verify_native_supply().unwrap();
}

#[test]
fn fulfill_available_respects_max_orders() {
    let mut s = Scenario::new();
    let alice = TestSigner::from_seed(1);
    let bob = TestSigner::from_seed(2);
    let orders = [s.listing(&alice, 1), s.listing(&bob, 2)];

    let receipt = s
        .market
        .fulfill_available_orders(
            &orders,
            &[vec![fc(0, 0)], vec![fc(1, 0)]],
            &[
                vec![fc(0, 0)],
                vec![fc(1, 0)],
                vec![fc(0, 1), fc(1, 1)],
                vec![fc(0, 2), fc(1, 2)],
            ],
            1,
            u(12),
            s.buyer,
        )
        .unwrap();

    assert_eq!(receipt.fulfilled.len(), 1);
    assert_eq!(receipt.skipped[0].index, 1);
    assert_eq!(s.market.ledger().owner_of(NFT, u(2)), Some(bob.address()));
    assert_eq!(s.native(FEE), u(1));
}

#[test]
fn fulfill_available_requires_covered_consideration() {
    let mut s = Scenario::new();
    let alice = TestSigner::from_seed(1);
    let orders = [s.listing(&alice, 1)];

    let err = s
        .market
        .fulfill_available_orders(
            &orders,
            &[vec![fc(0, 0)]],
            &[vec![fc(0, 0)], vec![fc(0, 1)]],
            1,
            u(12),
            s.buyer,
        )
        .unwrap_err();
    assert_eq!(
        err,
        TradeportError::ConsiderationNotMet {
            order_index: 0,
            item_index: 2,
        }
    );
    assert_eq!(s.native(s.buyer), u(100));
}

#[test]
fn fulfill_available_with_no_valid_orders_fails() {
    let mut s = Scenario::new();
    let alice = TestSigner::from_seed(1);
    let order = s.listing(&alice, 1);
    let components = order.parameters.to_components(U256::ZERO).unwrap();
    s.market.cancel(&[components], alice.address()).unwrap();

    let err = s
        .market
        .fulfill_available_orders(&[order], &[], &[], 1, u(12), s.buyer)
        .unwrap_err();
    assert_eq!(err, TradeportError::NoSpecifiedOrdersAvailable);
}

// =========================================================================
// Reads & configuration
// =========================================================================

#[test]
fn config_from_json_drives_domain() {
    let config = MarketplaceConfig::from_json_str(
        r#"{"name":"Bazaar","version":"2","chainId":1,"verifyingContract":"0x00000000000000000000000000000000000000aa"}"#,
    )
    .unwrap();
    let ledger = InMemoryLedger::new(config.verifying_contract);
    let market = Marketplace::new(config, ledger, FixedClock::at(0), FixedEntropy(B256::ZERO)).unwrap();
    let default = Scenario::new();

    assert_eq!(market.name(), "Bazaar");
    assert_eq!(market.information().version, "2");
    assert_ne!(
        market.information().domain_separator,
        default.market.information().domain_separator
    );
}

#[test]
fn typed_data_types_describe_order_components() {
    let s = Scenario::new();
    let types = s.market.typed_data_types();
    let fields = types["OrderComponents"].as_array().unwrap();
    assert_eq!(fields.len(), 7);
    assert_eq!(fields[1]["type"], "OfferItem[]");
    assert_eq!(fields[6]["name"], "counter");
    assert!(types.get("EIP712Domain").is_some());
}

#[test]
fn event_log_serializes_as_tagged_json() {
    let mut s = Scenario::new();
    let seller = TestSigner::from_seed(1);
    let order = s.listing(&seller, 1);
    s.market.fulfill_order(&order, u(12), s.buyer).unwrap();

    let json = serde_json::to_value(s.market.events()).unwrap();
    assert_eq!(json[0]["event"], "orderFulfilled");
}
