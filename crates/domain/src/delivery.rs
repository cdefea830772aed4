//! # 配信ステート
//!
//! 受信者 1 人分の配信処理が通過するステートマシンを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 要件 |
//! |---|------------|------|
//! | [`DeliveryState`] | 配信ステート | 受信者ごとに独立。1 回の配信内でリトライなし |
//!
//! ## 設計方針
//!
//! - **受信者ごとに独立**: ある受信者が終端の失敗ステートに落ちても、
//!   他の受信者の配信には影響しない
//! - **リトライなし**: 1 回の配信呼び出し内で終端ステートから戻る遷移は
//!   存在しない。再配信は次のイベント発火として扱う

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// 受信者 1 人分の配信ステート
///
/// 状態遷移:
/// `pending` → `validating` → (`rejected` | `rendering`) →
/// (`render_failed` | `dispatching`) → (`send_failed` | `sent`)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryState {
    /// 解決済み、処理待ち
    Pending,
    /// 配信先アドレスの検証中
    Validating,
    /// 検証で不適格（終端）
    Rejected,
    /// 件名・本文のレンダリング中
    Rendering,
    /// 本文レンダリングに失敗（終端）
    RenderFailed,
    /// トランスポートへ送信中
    Dispatching,
    /// 送信に失敗（終端）
    SendFailed,
    /// 送信完了（終端）
    Sent,
}

impl DeliveryState {
    /// このステートから `next` への遷移が正当かどうか
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Validating)
                | (Self::Validating, Self::Rejected | Self::Rendering)
                | (Self::Rendering, Self::RenderFailed | Self::Dispatching)
                | (Self::Dispatching, Self::SendFailed | Self::Sent)
        )
    }

    /// 終端ステート（これ以上遷移しない）かどうか
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::RenderFailed | Self::SendFailed | Self::Sent
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn delivery_state_の文字列変換が正しい() {
        assert_eq!(DeliveryState::Pending.to_string(), "pending");
        assert_eq!(DeliveryState::Validating.to_string(), "validating");
        assert_eq!(DeliveryState::Rejected.to_string(), "rejected");
        assert_eq!(DeliveryState::Rendering.to_string(), "rendering");
        assert_eq!(DeliveryState::RenderFailed.to_string(), "render_failed");
        assert_eq!(DeliveryState::Dispatching.to_string(), "dispatching");
        assert_eq!(DeliveryState::SendFailed.to_string(), "send_failed");
        assert_eq!(DeliveryState::Sent.to_string(), "sent");
    }

    #[rstest]
    #[case(DeliveryState::Pending, DeliveryState::Validating)]
    #[case(DeliveryState::Validating, DeliveryState::Rejected)]
    #[case(DeliveryState::Validating, DeliveryState::Rendering)]
    #[case(DeliveryState::Rendering, DeliveryState::RenderFailed)]
    #[case(DeliveryState::Rendering, DeliveryState::Dispatching)]
    #[case(DeliveryState::Dispatching, DeliveryState::SendFailed)]
    #[case(DeliveryState::Dispatching, DeliveryState::Sent)]
    fn test_正当な遷移を許可する(#[case] from: DeliveryState, #[case] to: DeliveryState) {
        assert!(from.can_transition_to(to));
    }

    #[rstest]
    #[case(DeliveryState::Pending, DeliveryState::Sent, "検証を飛ばせない")]
    #[case(DeliveryState::Rejected, DeliveryState::Rendering, "終端から戻れない")]
    #[case(DeliveryState::Sent, DeliveryState::Pending, "リトライなし")]
    #[case(DeliveryState::Validating, DeliveryState::Dispatching, "レンダリングを飛ばせない")]
    fn test_不正な遷移を拒否する(
        #[case] from: DeliveryState,
        #[case] to: DeliveryState,
        #[case] _reason: &str,
    ) {
        assert!(!from.can_transition_to(to));
    }

    #[test]
    fn test_終端ステートの判定が正しい() {
        assert!(DeliveryState::Rejected.is_terminal());
        assert!(DeliveryState::RenderFailed.is_terminal());
        assert!(DeliveryState::SendFailed.is_terminal());
        assert!(DeliveryState::Sent.is_terminal());

        assert!(!DeliveryState::Pending.is_terminal());
        assert!(!DeliveryState::Validating.is_terminal());
        assert!(!DeliveryState::Rendering.is_terminal());
        assert!(!DeliveryState::Dispatching.is_terminal());
    }
}
