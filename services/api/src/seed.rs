use crate::infra::{build_service, ApiService};
use clap::Args;
use flowjob::config::AppConfig;
use flowjob::error::AppError;
use flowjob::marketplace::{
    AccountRequest, BusinessDecision, BusinessId, BusinessProfile, IdentityId, JobId, JobPosting,
    MarketplaceError, RegisterBusinessRequest, RegisterWorkerRequest, SalaryUnit, SwipeDirection,
    WorkerId, WorkerProfile,
};
use serde::Serialize;
use tracing::info;

const SKILLS: &[&str] = &[
    "Communication",
    "Customer Service",
    "Sales",
    "Problem Solving",
    "Python",
    "JavaScript",
    "React",
    "Node.js",
    "Data Entry",
    "Project Management",
    "Cooking",
    "Cleaning",
    "Driving",
    "Cash Handling",
];
const TAGS: &[&str] = &[
    "Retail",
    "Hospitality",
    "Technology",
    "Food Service",
    "Customer Support",
    "Office Admin",
    "Warehouse",
    "Construction",
    "Education",
    "Healthcare",
];
const INDUSTRIES: &[&str] = &[
    "Technology",
    "Retail",
    "Hospitality",
    "Healthcare",
    "Finance",
    "Education",
    "Construction",
    "Food & Beverage",
];
const EXPERIENCE_LEVELS: &[&str] = &["Entry-level", "Intermediate", "Senior", "Expert"];
const AVAILABILITY: &[&str] = &[
    "Full-time",
    "Part-time",
    "Contract",
    "Internship",
    "Temporary",
    "Flexible Hours",
    "Remote",
    "On-Site",
    "Hybrid",
];
const BENEFITS: &[&str] = &[
    "Health Insurance",
    "Paid Time Off (PTO)",
    "Dental Insurance",
    "Vision Insurance",
    "401(k)",
    "Flexible Schedule",
    "Remote Work Options",
    "Paid Sick Leave",
    "Employee Discount",
];
const FIRST_NAMES: &[&str] = &[
    "Avery", "Jordan", "Riley", "Morgan", "Casey", "Quinn", "Rowan", "Sage", "Emerson", "Parker",
];
const LAST_NAMES: &[&str] = &[
    "Cohen", "Levi", "Mizrahi", "Peretz", "Biton", "Dahan", "Avraham", "Friedman", "Azulay",
    "Katz",
];
const JOB_TITLES: &[&str] = &[
    "Barista",
    "Line Cook",
    "Sales Associate",
    "Warehouse Picker",
    "Front Desk Agent",
    "Junior Developer",
    "Delivery Driver",
    "Office Assistant",
    "Tutor",
    "Cleaner",
];
const SEED_PASSWORD: &str = "flowjob-seed";

#[derive(Args, Debug)]
pub(crate) struct SeedArgs {
    /// Number of worker accounts to create
    #[arg(long, default_value_t = 10)]
    pub(crate) workers: usize,
    /// Number of business accounts to create
    #[arg(long, default_value_t = 5)]
    pub(crate) businesses: usize,
    /// Number of jobs to post, spread across the businesses
    #[arg(long, default_value_t = 20)]
    pub(crate) jobs: usize,
    /// Print the summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

impl Default for SeedArgs {
    fn default() -> Self {
        Self {
            workers: 10,
            businesses: 5,
            jobs: 20,
            json: false,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SeedSummary {
    pub(crate) workers: usize,
    pub(crate) businesses: usize,
    pub(crate) jobs: usize,
    pub(crate) likes: usize,
    pub(crate) dislikes: usize,
    pub(crate) rejections: usize,
    pub(crate) matches: usize,
    pub(crate) completed_profiles: usize,
}

pub(crate) async fn run_seed(args: SeedArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_service(&config.store);
    let summary = populate(&service, &args).await?;

    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Seed summary unavailable: {err}"),
        }
        return Ok(());
    }

    println!("FlowJob sample marketplace");
    println!(
        "- {} workers | {} businesses | {} jobs",
        summary.workers, summary.businesses, summary.jobs
    );
    println!(
        "- {} likes | {} dislikes | {} rejections",
        summary.likes, summary.dislikes, summary.rejections
    );
    println!("- {} matches promoted", summary.matches);
    println!(
        "- {} of {} profiles completed",
        summary.completed_profiles,
        summary.workers + summary.businesses
    );
    Ok(())
}

fn pick(list: &[&str], index: usize) -> String {
    list[index % list.len()].to_string()
}

fn sample(list: &[&str], start: usize, count: usize) -> Vec<String> {
    (0..count.min(list.len()))
        .map(|offset| pick(list, start + offset))
        .collect()
}

fn account(username: String, index: usize) -> AccountRequest {
    let email = format!("{username}@flowjob.test");
    AccountRequest {
        email: email.clone(),
        confirm_email: email,
        username,
        first_name: pick(FIRST_NAMES, index),
        last_name: pick(LAST_NAMES, index * 3 + 1),
        password: SEED_PASSWORD.to_string(),
        confirm_password: SEED_PASSWORD.to_string(),
    }
}

fn salary_unit(index: usize) -> SalaryUnit {
    if index % 2 == 0 {
        SalaryUnit::Hour
    } else {
        SalaryUnit::Month
    }
}

fn worker_request(index: usize) -> RegisterWorkerRequest {
    let salary_min = 50 + (index as u32 % 10) * 10;
    RegisterWorkerRequest {
        account: account(format!("worker_{index:03}"), index),
        profile: WorkerProfile {
            headline: Some(format!("{} looking for work", pick(EXPERIENCE_LEVELS, index))),
            experience_level: Some(pick(EXPERIENCE_LEVELS, index)),
            skills: sample(SKILLS, index, 3 + index % 5),
            preferred_tags: sample(TAGS, index * 2, 1 + index % 4),
            industry_preference: Some(pick(INDUSTRIES, index)),
            location_lat: Some(29.5 + (index % 38) as f64 / 10.0),
            location_lng: Some(34.2 + (index % 17) as f64 / 10.0),
            job_search_radius: Some([10, 25, 50, 100][index % 4]),
            salary_min: Some(salary_min),
            salary_max: Some(salary_min + 10 + (index as u32 % 9) * 10),
            salary_unit: Some(salary_unit(index)),
            availability: sample(AVAILABILITY, index, 1 + index % 3),
            willing_to_relocate: index % 7 == 0,
            ..WorkerProfile::default()
        },
    }
}

fn business_request(index: usize) -> RegisterBusinessRequest {
    RegisterBusinessRequest {
        account: account(format!("business_{index:03}"), index + 5),
        profile: BusinessProfile {
            name: format!("{} {}", pick(LAST_NAMES, index), pick(INDUSTRIES, index)),
            industry: Some(pick(INDUSTRIES, index)),
            header: Some(format!("Hiring across {}", pick(TAGS, index))),
            contact_email: Some(format!("jobs+{index}@flowjob.test")),
            ..BusinessProfile::default()
        },
    }
}

fn posting(index: usize) -> JobPosting {
    let remote = index % 7 == 0;
    let salary_min = 6_000 + (index as u32 % 15) * 1_000;
    JobPosting {
        title: pick(JOB_TITLES, index),
        industry: Some(pick(INDUSTRIES, index + 3)),
        description: format!(
            "{} needed. {} schedule, {} experience.",
            pick(JOB_TITLES, index),
            pick(AVAILABILITY, index),
            pick(EXPERIENCE_LEVELS, index + 1)
        ),
        tags: sample(TAGS, index + 1, 1 + index % 4),
        experience_required: Some(pick(EXPERIENCE_LEVELS, index + 1)),
        skills_needed: sample(SKILLS, index * 3, 2 + index % 4),
        availability: Some(pick(AVAILABILITY, index)),
        location_address: Some(if remote {
            "Remote".to_string()
        } else {
            format!("{} Market Street", 10 + index)
        }),
        location_lat: (!remote).then(|| 29.5 + (index % 38) as f64 / 10.0),
        location_lng: (!remote).then(|| 34.2 + (index % 17) as f64 / 10.0),
        is_remote: remote,
        salary_min: Some(salary_min),
        salary_max: Some(salary_min + 1_000 + (index as u32 % 10) * 1_000),
        salary_unit: Some(salary_unit(index + 1)),
        minimum_age: [None, Some(16), Some(18), Some(21)][index % 4],
        benefits: sample(BENEFITS, index, index % 5),
    }
}

/// Build a deterministic marketplace: workers swipe on roughly two thirds of the jobs,
/// and businesses accept or reject part of their applicants.
pub(crate) async fn populate(
    service: &ApiService,
    args: &SeedArgs,
) -> Result<SeedSummary, MarketplaceError> {
    let mut summary = SeedSummary::default();

    let mut workers: Vec<WorkerId> = Vec::with_capacity(args.workers);
    for index in 0..args.workers {
        let view = service.register_worker(worker_request(index)).await?;
        if index % 5 != 0 {
            service
                .complete_profile(&IdentityId::from(&view.record.id))
                .await?;
            summary.completed_profiles += 1;
        }
        workers.push(view.record.id);
    }
    summary.workers = workers.len();

    let mut businesses: Vec<BusinessId> = Vec::with_capacity(args.businesses);
    for index in 0..args.businesses {
        let view = service.register_business(business_request(index)).await?;
        if index % 3 != 2 {
            service
                .complete_profile(&IdentityId::from(&view.record.id))
                .await?;
            summary.completed_profiles += 1;
        }
        businesses.push(view.record.id);
    }
    summary.businesses = businesses.len();

    let mut jobs: Vec<(BusinessId, JobId)> = Vec::with_capacity(args.jobs);
    if !businesses.is_empty() {
        for index in 0..args.jobs {
            let owner = businesses[index % businesses.len()].clone();
            let view = service.post_job(&owner, posting(index)).await?;
            jobs.push((owner, view.record.id));
        }
    }
    summary.jobs = jobs.len();

    for (w, worker) in workers.iter().enumerate() {
        for (j, (_, job)) in jobs.iter().enumerate() {
            if (w + j) % 3 == 0 {
                continue;
            }
            let direction = if (w * 7 + j) % 5 < 2 {
                SwipeDirection::Like
            } else {
                SwipeDirection::Dislike
            };
            service.record_worker_swipe(worker, job, direction).await?;
            match direction {
                SwipeDirection::Like => summary.likes += 1,
                SwipeDirection::Dislike => summary.dislikes += 1,
            }
        }
    }

    for (owner, job) in &jobs {
        let applicants = service.job(job).await?.record.applicants;
        for (position, worker) in applicants.iter().enumerate() {
            let decision = if position % 4 == 3 {
                BusinessDecision::Reject
            } else {
                BusinessDecision::AcceptApplicant
            };
            let outcome = service
                .record_business_decision(owner, job, worker, decision)
                .await?;
            if outcome.promoted.is_some() {
                summary.matches += 1;
            }
            if decision == BusinessDecision::Reject {
                summary.rejections += 1;
            }
        }
    }

    info!(
        workers = summary.workers,
        businesses = summary.businesses,
        jobs = summary.jobs,
        matches = summary.matches,
        "sample marketplace populated"
    );
    Ok(summary)
}
