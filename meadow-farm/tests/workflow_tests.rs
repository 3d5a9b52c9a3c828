//! Workflow engine tests over the in-memory mock client.

use std::error::Error;
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use meadow_core::registry;
use meadow_core::token::{Token, TokenValue};
use meadow_farm::prelude::*;
use meadow_farm::presets;
use meadow_farm::testing::MockFarmClient;
use rust_decimal::Decimal;

const ONE_ETH: u64 = 1_000_000_000_000_000_000;

type Log = Arc<Mutex<Vec<(String, U256)>>>;

fn new_log() -> Log {
  Arc::new(Mutex::new(Vec::new()))
}

fn logged(log: &Log) -> Vec<(String, U256)> {
  log.lock().expect("log lock").clone()
}

fn tv(raw: u64, decimals: u8) -> TokenValue {
  TokenValue::new(U256::from(raw), decimals)
}

fn weth() -> Token {
  registry::weth()
}

fn usdc() -> Token {
  registry::usdc()
}

fn mead() -> Token {
  registry::mead().token
}

fn recipient() -> Address {
  Address::repeat_byte(0xaa)
}

/// Scales the running amount by `num / den`, inverting the ratio when the
/// run is reversed, and records every invocation.
struct Linear {
  name: String,
  num: u64,
  den: u64,
  log: Log,
}

impl Linear {
  fn new(name: &str, num: u64, den: u64, log: &Log) -> Linear {
    Linear {
      name: name.to_string(),
      num,
      den,
      log: Arc::clone(log),
    }
  }
}

#[async_trait]
impl StepGenerator for Linear {
  fn name(&self) -> &str {
    &self.name
  }

  async fn run(
    &self,
    amount_in: TokenValue,
    context: &RunContext,
  ) -> Result<Step, FarmError> {
    self
      .log
      .lock()
      .expect("log lock")
      .push((self.name.clone(), amount_in.raw()));
    let (num, den) = if context.run_mode.is_reversed() {
      (self.den, self.num)
    } else {
      (self.num, self.den)
    };
    let out = amount_in.mul_div_floor(U256::from(num), U256::from(den))?;
    Ok(Step::new(
      &self.name,
      out,
      Box::new(|_| Ok(FarmCall::new(Address::ZERO, Bytes::new()))),
    ))
  }
}

/// Builds fine but cannot be prepared into a call.
struct FailingPrepare;

#[async_trait]
impl StepGenerator for FailingPrepare {
  fn name(&self) -> &str {
    "failingPrepare"
  }

  async fn run(
    &self,
    amount_in: TokenValue,
    _context: &RunContext,
  ) -> Result<Step, FarmError> {
    Ok(Step::new(
      "failingPrepare",
      amount_in,
      Box::new(|_| {
        Err(FarmError::Build("prepare failure injected".to_string()))
      }),
    ))
  }
}

/// Pastes its first call-data word from a fixed source step index.
struct PasteFrom {
  source: usize,
}

#[async_trait]
impl StepGenerator for PasteFrom {
  fn name(&self) -> &str {
    "pasteFrom"
  }

  async fn run(
    &self,
    amount_in: TokenValue,
    _context: &RunContext,
  ) -> Result<Step, FarmError> {
    let source = self.source;
    Ok(Step::new(
      "pasteFrom",
      amount_in,
      Box::new(move |_| {
        Ok(
          FarmCall::new(Address::ZERO, Bytes::new())
            .with_clipboard(Clipboard::paste(Paste::slot(source, 0, 0))),
        )
      }),
    ))
  }
}

fn call_text(call: &FarmCall) -> String {
  String::from_utf8(call.call_data.to_vec()).expect("mock call data is utf8")
}

/// A two-hop swap workflow: 1 ETH -> 3000 USDC -> 2999 MEAD.
fn two_hop() -> (Arc<MockFarmClient>, FarmWorkflow) {
  let client = Arc::new(
    MockFarmClient::new()
      .with_rate(&weth(), &usdc(), 3_000_000_000, ONE_ETH)
      .with_rate(&usdc(), &mead(), 2_999, 3_000),
  );
  let mut farm = FarmWorkflow::new(
    Arc::<MockFarmClient>::clone(&client),
    "ethToMead",
  );
  let well_a = Address::repeat_byte(0x01);
  let well_b = Address::repeat_byte(0x02);
  farm
    .add_step(
      WellSwap::new(client.clone(), well_a, weth(), usdc(), recipient()),
      StepOptions::default(),
    )
    .expect("add first hop")
    .add_step(
      WellSwap::new(client.clone(), well_b, usdc(), mead(), recipient()),
      StepOptions::default(),
    )
    .expect("add second hop");
  (client, farm)
}

#[tokio::test]
async fn estimate_runs_generators_in_order() -> Result<(), FarmError> {
  let log = new_log();
  let client = Arc::new(MockFarmClient::new());
  let mut farm = FarmWorkflow::new(client, "chained");
  farm
    .add_step(Linear::new("double", 2, 1, &log), StepOptions::default())?
    .add_step(Linear::new("triple", 3, 1, &log), StepOptions::default())?
    .add_step(Linear::new("halve", 1, 2, &log), StepOptions::default())?;

  let out = farm.estimate(tv(10, 6)).await?;
  assert_eq!(U256::from(30u64), out.raw());

  // Each generator saw exactly the previous step's output.
  let entries = logged(&log);
  assert_eq!(
    vec![
      ("double".to_string(), U256::from(10u64)),
      ("triple".to_string(), U256::from(20u64)),
      ("halve".to_string(), U256::from(60u64)),
    ],
    entries
  );
  Ok(())
}

#[tokio::test]
async fn reversed_estimate_walks_backwards() -> Result<(), FarmError> {
  let log = new_log();
  let client = Arc::new(MockFarmClient::new());
  let mut farm = FarmWorkflow::new(client, "chained");
  farm
    .add_step(Linear::new("double", 2, 1, &log), StepOptions::default())?
    .add_step(Linear::new("triple", 3, 1, &log), StepOptions::default())?;

  let amount_in = farm.estimate_reversed(tv(60, 6)).await?;
  assert_eq!(U256::from(10u64), amount_in.raw());

  let entries = logged(&log);
  assert_eq!(
    vec![
      ("triple".to_string(), U256::from(60u64)),
      ("double".to_string(), U256::from(20u64)),
    ],
    entries
  );
  Ok(())
}

#[tokio::test]
async fn reverse_round_trips_forward_estimate() -> Result<(), FarmError> {
  let (_client, farm) = two_hop();
  for raw_eth in [ONE_ETH, ONE_ETH / 2, 3 * ONE_ETH] {
    let out = farm.estimate(tv(raw_eth, 18)).await?;
    let back = farm.estimate_reversed(out).await?;
    assert_eq!(U256::from(raw_eth), back.raw());
  }
  Ok(())
}

#[tokio::test]
async fn nested_groups_flatten_in_insertion_order() -> Result<(), FarmError> {
  let log = new_log();
  let client = Arc::new(MockFarmClient::new());
  let mut farm = FarmWorkflow::new(client, "nested");
  farm.add(
    StepInput::group(vec![
      StepInput::step(Linear::new("a", 1, 1, &log)),
      StepInput::group(vec![
        StepInput::step(Linear::new("b", 1, 1, &log)),
        StepInput::step(Linear::new("c", 1, 1, &log)),
      ]),
      StepInput::step(Linear::new("d", 1, 1, &log)),
    ]),
    StepOptions::default(),
  )?;
  assert_eq!(4, farm.len());

  farm.estimate(tv(5, 6)).await?;
  let names: Vec<String> =
    logged(&log).into_iter().map(|(name, _)| name).collect();
  assert_eq!(vec!["a", "b", "c", "d"], names);
  Ok(())
}

#[tokio::test]
async fn duplicate_explicit_tags_rejected_at_add() {
  let log = new_log();
  let client = Arc::new(MockFarmClient::new());
  let mut farm = FarmWorkflow::new(client, "tagged");
  farm
    .add_step(Linear::new("a", 1, 1, &log), StepOptions::tagged("amount"))
    .expect("first tag");
  let result =
    farm.add_step(Linear::new("b", 1, 1, &log), StepOptions::tagged("amount"));
  assert!(matches!(result, Err(FarmError::DuplicateTag(tag)) if tag == "amount"));
}

#[tokio::test]
async fn tags_cannot_target_groups() {
  let log = new_log();
  let client = Arc::new(MockFarmClient::new());
  let mut farm = FarmWorkflow::new(client, "tagged");
  let result = farm.add(
    StepInput::group(vec![
      StepInput::step(Linear::new("a", 1, 1, &log)),
      StepInput::step(Linear::new("b", 1, 1, &log)),
    ]),
    StepOptions::tagged("pair"),
  );
  assert!(matches!(result, Err(FarmError::Build(_))));
}

#[tokio::test]
async fn skipped_steps_never_run() -> Result<(), FarmError> {
  let log = new_log();
  let client = Arc::new(MockFarmClient::new());
  let mut farm = FarmWorkflow::new(client, "skippy");
  let skip = StepOptions {
    skip: true,
    ..StepOptions::default()
  };
  farm
    .add_step(Linear::new("skipped", 1_000, 1, &log), skip)?
    .add_step(Linear::new("kept", 3, 1, &log), StepOptions::default())?;

  let out = farm.estimate(tv(10, 6)).await?;
  assert_eq!(U256::from(30u64), out.raw());
  assert_eq!(1, logged(&log).len());
  Ok(())
}

#[tokio::test]
async fn only_execute_steps_join_static_runs() -> Result<(), FarmError> {
  let log = new_log();
  let client = Arc::new(MockFarmClient::new());
  let mut farm =
    FarmWorkflow::new(Arc::<MockFarmClient>::clone(&client), "approval");
  let only_execute = StepOptions {
    only_execute: true,
    ..StepOptions::default()
  };
  farm
    .add_step(Linear::new("approve", 1, 1, &log), only_execute)?
    .add_step(Linear::new("double", 2, 1, &log), StepOptions::default())?;

  // Plain estimates leave the approval out.
  farm.estimate(tv(10, 6)).await?;
  assert_eq!(1, logged(&log).len());

  // Execution includes it, and the submitted batch carries both calls.
  farm.execute(tv(10, 6), ExecuteOptions::default()).await?;
  let submissions = client.submissions();
  assert_eq!(1, submissions.len());
  assert_eq!(2, submissions[0].len());
  Ok(())
}

#[tokio::test]
async fn two_hop_scenario_estimates_and_encodes() -> Result<(), FarmError> {
  let (client, farm) = two_hop();

  // 1 ETH forward -> 2999 MEAD.
  let out = farm.estimate(tv(ONE_ETH, 18)).await?;
  assert_eq!(U256::from(2_999_000_000u64), out.raw());

  // 2999 MEAD backward -> exactly 1 ETH.
  let back = farm.estimate_reversed(tv(2_999_000_000, 6)).await?;
  assert_eq!(U256::from(ONE_ETH), back.raw());

  // Execution at 0.5% slippage: each swap encodes its slipped minimum.
  farm
    .execute(
      tv(ONE_ETH, 18),
      ExecuteOptions::with_slippage(Decimal::new(5, 1)),
    )
    .await?;
  let submissions = client.submissions();
  assert_eq!(1, submissions.len());
  let batch = &submissions[0];
  assert_eq!(2, batch.len());
  // 3000 USDC * 0.995.
  assert!(call_text(&batch.calls[0]).contains(",2985000000,"));
  // 2999 MEAD * 0.995 = 2984.005, truncated at six decimals.
  assert!(call_text(&batch.calls[1]).contains(",2984005000,"));
  Ok(())
}

#[tokio::test]
async fn execute_is_atomic_when_prepare_fails() {
  let log = new_log();
  let client = Arc::new(MockFarmClient::new());
  let mut farm =
    FarmWorkflow::new(Arc::<MockFarmClient>::clone(&client), "brittle");
  for name in ["a", "b"] {
    farm
      .add_step(Linear::new(name, 1, 1, &log), StepOptions::default())
      .expect("add");
  }
  farm
    .add_step(FailingPrepare, StepOptions::default())
    .expect("add failing");
  for name in ["d", "e"] {
    farm
      .add_step(Linear::new(name, 1, 1, &log), StepOptions::default())
      .expect("add");
  }

  let result = farm.execute(tv(10, 6), ExecuteOptions::default()).await;
  assert!(matches!(result, Err(FarmError::Build(_))));
  // Nothing reached the farm: all five steps built, the third refused to
  // prepare, and the batch was never submitted.
  assert!(client.submissions().is_empty());
}

#[tokio::test]
async fn clipboard_references_must_point_backwards() {
  for source in 0..6_usize {
    let log = new_log();
    let client = Arc::new(MockFarmClient::new());
    let mut farm =
      FarmWorkflow::new(Arc::<MockFarmClient>::clone(&client), "pasting");
    for name in ["a", "b", "c"] {
      farm
        .add_step(Linear::new(name, 1, 1, &log), StepOptions::default())
        .expect("add");
    }
    farm
      .add_step(PasteFrom { source }, StepOptions::default())
      .expect("add paste");

    let result = farm.execute(tv(1, 6), ExecuteOptions::default()).await;
    if source < 3 {
      assert!(result.is_ok(), "paste from earlier step {source} must pass");
    } else {
      // Pasting from itself (3) or a later step is a build failure, and
      // nothing may be submitted.
      assert!(matches!(
        result,
        Err(FarmError::ForwardReference { from: 3, to, .. }) if to == source
      ));
      assert!(client.submissions().is_empty());
    }
  }
}

#[tokio::test]
async fn missing_slippage_aborts_execution() {
  let (client, farm) = two_hop();
  let result = farm.execute(tv(ONE_ETH, 18), ExecuteOptions::default()).await;
  assert!(matches!(result, Err(FarmError::SlippageMissing)));
  assert!(client.submissions().is_empty());
}

#[tokio::test]
async fn quote_failures_carry_their_cause() {
  let client = Arc::new(MockFarmClient::new().failing_quotes());
  let mut farm =
    FarmWorkflow::new(Arc::<MockFarmClient>::clone(&client), "unquotable");
  farm
    .add_step(
      WellSwap::new(
        client,
        Address::repeat_byte(0x01),
        weth(),
        usdc(),
        recipient(),
      ),
      StepOptions::default(),
    )
    .expect("add swap");

  let result = farm.estimate(tv(ONE_ETH, 18)).await;
  match result {
    Err(error @ FarmError::Quote { .. }) => {
      assert!(error.source().is_some());
      assert!(matches!(
        &error,
        FarmError::Quote { step, .. } if step == "wellSwap"
      ));
    }
    other => panic!("expected quote error, got {other:?}"),
  }
}

#[tokio::test]
async fn convert_cannot_estimate_in_reverse() {
  let client = Arc::new(MockFarmClient::new());
  let mut farm =
    FarmWorkflow::new(Arc::<MockFarmClient>::clone(&client), "convert");
  farm
    .add_step(
      ConvertDeposits::new(
        client,
        mead(),
        registry::mead_weth_lp().token,
        vec![4],
        vec![U256::from(1_000_000u64)],
      )
      .expect("convert action"),
      StepOptions::default(),
    )
    .expect("add convert");

  let result = farm.estimate_reversed(tv(1_000_000, 18)).await;
  assert!(matches!(
    result,
    Err(FarmError::UnsupportedDirection { step }) if step == "convertDeposits"
  ));
}

#[tokio::test]
async fn transfer_pastes_only_from_adjacent_tagged_step(
) -> Result<(), FarmError> {
  // Adjacent: the transfer's amount argument is zeroed and pasted from the
  // swap's return data.
  let client = Arc::new(
    MockFarmClient::new().with_rate(&weth(), &usdc(), 3_000_000_000, ONE_ETH),
  );
  let mut farm =
    FarmWorkflow::new(Arc::<MockFarmClient>::clone(&client), "adjacent");
  farm
    .add_step(
      WellSwap::new(
        client.clone(),
        Address::repeat_byte(0x01),
        weth(),
        usdc(),
        recipient(),
      ),
      StepOptions::tagged("swapOut"),
    )?
    .add_step(
      TransferToken::new(
        client.clone(),
        usdc(),
        recipient(),
        FarmFromMode::Internal,
        FarmToMode::External,
      )
      .copy_amount_from("swapOut"),
      StepOptions::default(),
    )?;
  farm
    .execute(
      tv(ONE_ETH, 18),
      ExecuteOptions::with_slippage(Decimal::new(5, 1)),
    )
    .await?;
  let batch = &client.submissions()[0];
  let transfer = &batch.calls[1];
  assert_eq!(
    vec![Paste::slot(0, 0, 2)],
    transfer.clipboard.pastes
  );
  assert!(call_text(transfer).contains(",0,"));

  // Not adjacent: a mow lands between them, so the literal amount is
  // encoded and no clipboard is attached.
  let client = Arc::new(
    MockFarmClient::new().with_rate(&weth(), &usdc(), 3_000_000_000, ONE_ETH),
  );
  let mut farm =
    FarmWorkflow::new(Arc::<MockFarmClient>::clone(&client), "gapped");
  farm
    .add_step(
      WellSwap::new(
        client.clone(),
        Address::repeat_byte(0x01),
        weth(),
        usdc(),
        recipient(),
      ),
      StepOptions::tagged("swapOut"),
    )?
    .add_step(
      Mow::new(client.clone(), recipient(), usdc()),
      StepOptions::default(),
    )?
    .add_step(
      TransferToken::new(
        client.clone(),
        usdc(),
        recipient(),
        FarmFromMode::Internal,
        FarmToMode::External,
      )
      .copy_amount_from("swapOut"),
      StepOptions::default(),
    )?;
  farm
    .execute(
      tv(ONE_ETH, 18),
      ExecuteOptions::with_slippage(Decimal::new(5, 1)),
    )
    .await?;
  let batch = &client.submissions()[0];
  let transfer = &batch.calls[2];
  assert!(transfer.clipboard.is_empty());
  assert!(call_text(transfer).contains(",3000000000,"));
  Ok(())
}

#[tokio::test]
async fn eth_preset_carries_ether_value() -> Result<(), FarmError> {
  let client = Arc::new(
    MockFarmClient::new().with_rate(&weth(), &mead(), 3_000_000_000, ONE_ETH),
  );
  let addresses = registry::ProtocolAddresses::default();
  let mut farm =
    FarmWorkflow::new(Arc::<MockFarmClient>::clone(&client), "ethIn");
  farm.add(
    presets::eth_to_mead(client.clone(), &addresses, recipient()),
    StepOptions::default(),
  )?;
  assert_eq!(2, farm.len());

  farm
    .execute(
      tv(ONE_ETH, 18),
      ExecuteOptions::with_slippage(Decimal::new(5, 1)),
    )
    .await?;
  let batch = &client.submissions()[0];
  assert_eq!(U256::from(ONE_ETH), batch.value);
  assert_eq!(U256::from(ONE_ETH), batch.calls[0].value);
  assert!(call_text(&batch.calls[0]).starts_with("wrapEth("));
  assert!(call_text(&batch.calls[1]).starts_with("wellSwap("));
  Ok(())
}

#[tokio::test]
async fn call_static_reports_each_step() -> Result<(), FarmError> {
  let (_mock, farm) = two_hop();
  let results = farm
    .call_static(
      tv(ONE_ETH, 18),
      ExecuteOptions::with_slippage(Decimal::new(5, 1)),
    )
    .await?;
  assert_eq!(2, results.len());
  assert!(results.iter().all(|step| step.name == "wellSwap"));
  // The mock returns zeroed words; the swap decoder reads them as zero.
  assert!(results
    .iter()
    .all(|step| step.amount.as_ref().is_some_and(TokenValue::is_zero)));
  Ok(())
}

#[tokio::test]
async fn gas_estimation_prepares_the_full_batch() -> Result<(), FarmError> {
  let (_mock, farm) = two_hop();
  let gas = farm
    .estimate_gas(
      tv(ONE_ETH, 18),
      ExecuteOptions::with_slippage(Decimal::new(5, 1)),
    )
    .await?;
  assert_eq!(650_000, gas);
  Ok(())
}

#[test]
fn empty_workflow_estimates_to_identity() {
  let client = Arc::new(MockFarmClient::new());
  let farm = FarmWorkflow::new(client, "empty");
  let out = tokio_test::block_on(farm.estimate(tv(7, 6))).expect("estimate");
  assert_eq!(U256::from(7u64), out.raw());
}

#[tokio::test]
async fn empty_workflow_cannot_execute() {
  let client = Arc::new(MockFarmClient::new());
  let farm =
    FarmWorkflow::new(Arc::<MockFarmClient>::clone(&client), "empty");
  let result = farm.execute(tv(7, 6), ExecuteOptions::default()).await;
  assert!(matches!(result, Err(FarmError::Build(_))));
  assert!(client.submissions().is_empty());
}
