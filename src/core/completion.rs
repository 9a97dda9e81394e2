use crate::domain::model::{Operation, Reply};
use crate::utils::error::{BrokerError, Result};
use tokio::sync::oneshot;

/// 交給擴充處理器的一次性完成通知。
///
/// `complete` 會消耗掉自己，所以同一個請求不可能被完成兩次。
/// 處理器如果沒呼叫就把它丟掉（或 panic），等待中的請求會收到
/// `ExtensionAbandoned`。沒有逾時機制：一直持有不放的處理器會讓請求一直等下去。
#[derive(Debug)]
pub struct Completion {
    operation: Operation,
    sender: oneshot::Sender<Option<Reply>>,
}

/// `Completion` 的接收端，由 HTTP 層持有
#[derive(Debug)]
pub struct PendingReply {
    operation: Operation,
    receiver: oneshot::Receiver<Option<Reply>>,
}

impl Completion {
    pub fn channel(operation: Operation) -> (Completion, PendingReply) {
        let (sender, receiver) = oneshot::channel();
        (
            Completion { operation, sender },
            PendingReply {
                operation,
                receiver,
            },
        )
    }

    pub fn complete(self, reply: Reply) {
        self.send(Some(reply));
    }

    /// 不帶結果完成，broker 會使用該操作的預設回覆
    pub fn complete_empty(self) {
        self.send(None);
    }

    fn send(self, reply: Option<Reply>) {
        if self.sender.send(reply).is_err() {
            tracing::debug!(
                "{} request went away before the extension completed it",
                self.operation
            );
        }
    }
}

impl PendingReply {
    pub async fn wait(self) -> Result<Reply> {
        match self.receiver.await {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => Ok(Reply::default_for(self.operation)),
            Err(_) => Err(BrokerError::ExtensionAbandoned {
                operation: self.operation,
            }),
        }
    }
}
