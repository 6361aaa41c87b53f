//! Customer emails sent after an order changes.
//!
//! Every send is best-effort: the state change it reports has already been
//! committed, so a delivery failure is logged and otherwise ignored. Emails
//! are queued and handed to the mailer by a background task, in the order
//! they were queued, so a slow transport never holds up the request.

use std::sync::{Arc, OnceLock};

use common::AggregateId;
use domain::{CustomerId, Order};
use tokio::sync::{mpsc, oneshot};

use crate::services::{Email, Mailer, UserDirectory};

enum Job {
    Send {
        customer_id: CustomerId,
        subject: String,
        html_body: String,
    },
    Flush(oneshot::Sender<()>),
}

/// Renders order emails and queues them for delivery.
#[derive(Clone)]
pub struct Notifier {
    courier: Arc<Courier>,
    queue: Arc<OnceLock<mpsc::UnboundedSender<Job>>>,
}

impl Notifier {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        mailer: Arc<dyn Mailer>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            courier: Arc::new(Courier {
                directory,
                mailer,
                from: from.into(),
            }),
            queue: Arc::new(OnceLock::new()),
        }
    }

    pub fn order_received(&self, order_id: AggregateId, order: &Order) {
        let (subject, html_body) = order_received(order_id, order);
        self.enqueue(order, subject, html_body);
    }

    pub fn order_confirmed(&self, order_id: AggregateId, order: &Order) {
        let (subject, html_body) = order_confirmed(order_id);
        self.enqueue(order, subject, html_body);
    }

    pub fn order_shipped(&self, order_id: AggregateId, order: &Order) {
        let (subject, html_body) = order_shipped(
            order_id,
            order.carrier().unwrap_or_default(),
            order.tracking_number().unwrap_or_default(),
        );
        self.enqueue(order, subject, html_body);
    }

    /// Waits until every email queued so far has been handed to the mailer.
    pub async fn flush(&self) {
        let Some(queue) = self.queue.get() else {
            return;
        };
        let (done, wait) = oneshot::channel();
        if queue.send(Job::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    fn enqueue(&self, order: &Order, subject: String, html_body: String) {
        let Some(customer_id) = order.customer_id() else {
            return;
        };

        // The worker starts with the first email, on the caller's runtime
        let queue = self.queue.get_or_init(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(Arc::clone(&self.courier).run(rx));
            tx
        });
        let job = Job::Send {
            customer_id,
            subject,
            html_body,
        };
        if queue.send(job).is_err() {
            tracing::warn!(%customer_id, "mail queue closed, email dropped");
        }
    }
}

/// Looks up recipients and hands emails to the mailer.
struct Courier {
    directory: Arc<dyn UserDirectory>,
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl Courier {
    async fn run(self: Arc<Self>, mut jobs: mpsc::UnboundedReceiver<Job>) {
        while let Some(job) = jobs.recv().await {
            match job {
                Job::Send {
                    customer_id,
                    subject,
                    html_body,
                } => self.deliver(customer_id, subject, html_body).await,
                Job::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        tracing::debug!("mail queue drained");
    }

    async fn deliver(&self, customer_id: CustomerId, subject: String, html_body: String) {
        let Some(recipient) = self.recipient(customer_id).await else {
            tracing::debug!(%customer_id, %subject, "no email on file, skipping");
            return;
        };

        let email = Email {
            from: self.from.clone(),
            recipient,
            subject,
            html_body,
        };
        let subject = email.subject.clone();
        if let Err(e) = self.mailer.send(email).await {
            tracing::warn!(%customer_id, %subject, error = %e, "failed to send email");
        }
    }

    async fn recipient(&self, customer_id: CustomerId) -> Option<String> {
        self.directory
            .email_of(customer_id)
            .await
            .filter(|email| !email.trim().is_empty())
    }
}

fn order_received(order_id: AggregateId, order: &Order) -> (String, String) {
    (
        format!("Order Received - #{order_id}"),
        format!(
            "<h1>Order Received</h1><p>We have received your order #{order_id} for {}.</p>\
             <p>It will be processed as soon as payment is complete.</p>",
            order.total()
        ),
    )
}

fn order_confirmed(order_id: AggregateId) -> (String, String) {
    (
        format!("Order Confirmed - #{order_id}"),
        format!(
            "<h1>Thank You!</h1><p>Your order #{order_id} has been confirmed and is now being processed.</p>"
        ),
    )
}

fn order_shipped(order_id: AggregateId, carrier: &str, tracking_number: &str) -> (String, String) {
    (
        format!("Your Order #{order_id} has Shipped!"),
        format!(
            "<h1>On Its Way!</h1><p>Your order #{order_id} has been shipped via {carrier}.</p>\
             <p>Tracking Number: <strong>{tracking_number}</strong></p>"
        ),
    )
}
